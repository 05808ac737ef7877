use std::{future::Future, time::Duration};

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::utils::clock::Clock;

use super::{
    notifier::Notifier,
    session::{SessionLength, Tick, TimerSession},
};

pub const DEFAULT_TICK_FREQUENCY: Duration = Duration::from_millis(250);

/// A wall clock gap this many ticks long between two ticks means the process was suspended.
const RESUME_GAP_TICKS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    /// Pause when running, start otherwise.
    TogglePause,
    Reset,
    Select(SessionLength),
    /// Recompute right away, e.g. when the user comes back to the terminal.
    Refresh,
}

/// What the display needs to know about the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStatus {
    pub remaining_seconds: u64,
    pub running: bool,
    pub length: SessionLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed { length: SessionLength },
    Cancelled { remaining_seconds: u64 },
}

/// Drives a [TimerSession]: recomputes it on every tick and command, publishes its status and
/// handles the end of the run.
pub struct SessionRunner {
    session: TimerSession,
    commands: mpsc::Receiver<TimerCommand>,
    notifier: Box<dyn Notifier>,
    shutdown: CancellationToken,
    tick_frequency: Duration,
    time_provider: Box<dyn Clock>,
    status: watch::Sender<TimerStatus>,
}

impl SessionRunner {
    pub fn new(
        session: TimerSession,
        commands: mpsc::Receiver<TimerCommand>,
        notifier: Box<dyn Notifier>,
        shutdown: CancellationToken,
        tick_frequency: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        let (status, _) = watch::channel(status_of(&session));
        Self {
            session,
            commands,
            notifier,
            shutdown,
            tick_frequency,
            time_provider,
            status,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerStatus> {
        self.status.subscribe()
    }

    fn apply(&mut self, command: TimerCommand) {
        debug!("Applying {command:?}");
        let accepted = match command {
            TimerCommand::Start => self.session.start(),
            TimerCommand::Pause => self.session.pause(),
            TimerCommand::TogglePause if self.session.is_running() => self.session.pause(),
            TimerCommand::TogglePause => self.session.start(),
            TimerCommand::Reset => {
                self.session.reset();
                true
            }
            TimerCommand::Select(length) => self.session.select_length(length),
            TimerCommand::Refresh => true,
        };
        if !accepted {
            debug!("Command {command:?} rejected in state {:?}", self.session.state());
        }
    }

    fn publish(&self) {
        self.status.send_replace(status_of(&self.session));
    }

    /// Executes the timer event loop until the run finishes or the shutdown token is cancelled.
    /// `on_finish` is awaited after the notification, once.
    #[instrument(skip_all)]
    pub async fn run<F, Fut>(mut self, on_finish: F) -> Result<SessionOutcome>
    where
        F: FnOnce(SessionLength) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut accepting_commands = true;
        let mut next_tick = self.time_provider.instant() + self.tick_frequency;
        let mut last_tick = self.time_provider.time();

        loop {
            if let Tick::Finished = self.session.tick() {
                self.publish();
                let length = self.session.length();
                // Best effort, a silent finish is still a finish.
                if let Err(e) = self.notifier.notify().await {
                    warn!("Failed to play the end of session notification {e:?}");
                }
                on_finish(length).await;
                return Ok(SessionOutcome::Completed { length });
            }
            self.publish();

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let remaining_seconds = self.session.remaining_seconds();
                    info!("Session cancelled with {remaining_seconds}s left");
                    return Ok(SessionOutcome::Cancelled { remaining_seconds });
                }
                command = self.commands.recv(), if accepting_commands => match command {
                    Some(command) => self.apply(command),
                    None => {
                        debug!("Command channel closed");
                        accepting_commands = false;
                    }
                },
                _ = self.time_provider.sleep_until(next_tick) => {
                    let now = self.time_provider.time();
                    let gap = now - last_tick;
                    if gap > chrono::Duration::from_std(self.tick_frequency)? * RESUME_GAP_TICKS {
                        info!("Wall clock jumped {}s since the last tick, recomputing", gap.num_seconds());
                    }
                    last_tick = now;
                    // Don't replay ticks missed while suspended.
                    next_tick = (next_tick + self.tick_frequency).max(self.time_provider.instant());
                }
            }
        }
    }
}

fn status_of(session: &TimerSession) -> TimerStatus {
    TimerStatus {
        remaining_seconds: session.remaining_seconds(),
        running: session.is_running(),
        length: session.length(),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        time::Duration,
    };

    use anyhow::{anyhow, Result};
    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        timer::{
            notifier::MockNotifier,
            session::{SessionLength, TimerSession},
        },
        utils::{clock::test_clock::TokioClock, logging::TEST_LOGGING},
    };

    use super::{SessionOutcome, SessionRunner, TimerCommand, DEFAULT_TICK_FREQUENCY};

    fn runner(
        minutes: i64,
        notifier: MockNotifier,
        shutdown: &CancellationToken,
    ) -> (SessionRunner, mpsc::Sender<TimerCommand>) {
        let clock = TokioClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap());
        let mut session =
            TimerSession::new(SessionLength::from_minutes(minutes), Box::new(clock.clone()));
        session.start();
        let (sender, receiver) = mpsc::channel(8);
        let runner = SessionRunner::new(
            session,
            receiver,
            Box::new(notifier),
            shutdown.clone(),
            DEFAULT_TICK_FREQUENCY,
            Box::new(clock),
        );
        (runner, sender)
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_completes_once() -> Result<()> {
        *TEST_LOGGING;
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|| Ok(()));
        let shutdown = CancellationToken::new();
        let (runner, _sender) = runner(1, notifier, &shutdown);

        let finished = Cell::new(0);
        let started = tokio::time::Instant::now();
        let outcome = runner
            .run(|length| {
                finished.set(finished.get() + 1);
                assert_eq!(length.minutes(), 1);
                async {}
            })
            .await?;

        assert_eq!(
            outcome,
            SessionOutcome::Completed {
                length: SessionLength::from_minutes(1)
            }
        );
        assert_eq!(finished.get(), 1);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(60));
        assert!(elapsed < Duration::from_secs(61));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_notification_still_completes() -> Result<()> {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|| Err(anyhow!("no audio device")));
        let shutdown = CancellationToken::new();
        let (runner, _sender) = runner(1, notifier, &shutdown);

        let finished = Cell::new(false);
        let outcome = runner
            .run(|_| {
                finished.set(true);
                async {}
            })
            .await?;

        assert!(matches!(outcome, SessionOutcome::Completed { .. }));
        assert!(finished.get());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reports_remaining() -> Result<()> {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();
        let shutdown = CancellationToken::new();
        let (runner, _sender) = runner(10, notifier, &shutdown);

        let (outcome, _) = tokio::join!(runner.run(|_| async { panic!("must not finish") }), async {
            tokio::time::sleep(Duration::from_secs(100)).await;
            shutdown.cancel();
        });

        assert_eq!(
            outcome?,
            SessionOutcome::Cancelled {
                remaining_seconds: 500
            }
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume_through_commands() -> Result<()> {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|| Ok(()));
        let shutdown = CancellationToken::new();
        let (runner, sender) = runner(1, notifier, &shutdown);
        let status = runner.subscribe();

        let started = tokio::time::Instant::now();
        let (outcome, observed) = tokio::join!(runner.run(|_| async {}), async {
            tokio::time::sleep(Duration::from_secs(20)).await;
            sender.send(TimerCommand::TogglePause).await.unwrap();
            tokio::time::sleep(Duration::from_secs(300)).await;
            let paused = *status.borrow();
            // Length changes are ignored once resumed.
            sender.send(TimerCommand::Start).await.unwrap();
            sender
                .send(TimerCommand::Select(SessionLength::from_minutes(20)))
                .await
                .unwrap();
            paused
        });

        assert!(!observed.running);
        assert_eq!(observed.remaining_seconds, 40);
        assert_eq!(
            outcome?,
            SessionOutcome::Completed {
                length: SessionLength::from_minutes(1)
            }
        );
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(360));
        assert!(elapsed < Duration::from_secs(361));
        Ok(())
    }
}
