use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. Timer sessions and the
/// day store read the wall clock only through this trait so tests can move time at will.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: tokio::time::Instant);

    /// Wall clock in milliseconds since the epoch.
    fn millis(&self) -> i64 {
        self.time().timestamp_millis()
    }
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: tokio::time::Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

#[cfg(test)]
pub mod test_clock {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tokio::time::Instant;

    use super::Clock;

    /// Wall clock that only moves when told to.
    #[derive(Clone)]
    pub struct ManualClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Arc::new(Mutex::new(start)),
            }
        }

        pub fn advance(&self, duration: chrono::Duration) {
            *self.now.lock().unwrap() += duration;
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn time(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    /// Wall clock that follows tokio time, so it can be fast-forwarded with paused tests.
    #[derive(Clone)]
    pub struct TokioClock {
        pub start_time: DateTime<Utc>,
        pub reference: Instant,
    }

    impl TokioClock {
        pub fn new(start_time: DateTime<Utc>) -> Self {
            Self {
                start_time,
                reference: Instant::now(),
            }
        }
    }

    #[async_trait]
    impl Clock for TokioClock {
        fn time(&self) -> DateTime<Utc> {
            self.start_time + chrono::Duration::from_std(self.reference.elapsed()).unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }
}
