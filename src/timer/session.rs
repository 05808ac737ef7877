use std::{convert::Infallible, fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::utils::clock::Clock;

/// Length of a meditation session in whole minutes. Always at least one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionLength(u32);

impl SessionLength {
    pub const PRESETS: [SessionLength; 4] = [
        SessionLength(5),
        SessionLength(10),
        SessionLength(15),
        SessionLength(20),
    ];

    pub const DEFAULT: SessionLength = SessionLength(10);

    /// Custom length. Anything below one minute is clamped to one minute.
    pub fn from_minutes(minutes: i64) -> Self {
        Self(minutes.clamp(1, u32::MAX as i64) as u32)
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn seconds(&self) -> u64 {
        self.0 as u64 * 60
    }
}

impl Default for SessionLength {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for SessionLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} min", self.0)
    }
}

/// Parsing never fails. Input that isn't a number counts as the minimum.
impl FromStr for SessionLength {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s.trim().parse::<i64>().unwrap_or(1);
        Ok(Self::from_minutes(minutes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not running. Holds the remaining time that the next start continues from.
    Idle { remaining_seconds: u64 },
    /// Anchored to an absolute end. Remaining time is derived from the clock on demand.
    Running { end_at: DateTime<Utc> },
    /// The run reached zero.
    Expired,
}

/// Result of recomputing the timer against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Idle { remaining_seconds: u64 },
    Running { remaining_seconds: u64 },
    /// The run just reached zero. Reported once per run.
    Finished,
    Expired,
}

/// Countdown anchored to the wall clock. Nothing is ever decremented: the remaining time of a
/// running timer is always `end_at - now`, which keeps it correct when the process is suspended
/// and resumed.
pub struct TimerSession {
    length: SessionLength,
    state: TimerState,
    finish_reported: bool,
    clock: Box<dyn Clock>,
}

impl TimerSession {
    pub fn new(length: SessionLength, clock: Box<dyn Clock>) -> Self {
        Self {
            length,
            state: TimerState::Idle {
                remaining_seconds: length.seconds(),
            },
            finish_reported: false,
            clock,
        }
    }

    pub fn length(&self) -> SessionLength {
        self.length
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    fn remaining_until(&self, end_at: DateTime<Utc>) -> u64 {
        let millis = (end_at - self.clock.time()).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            // ceil, a timer showing 0 is a finished timer
            ((millis + 999) / 1000) as u64
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        match self.state {
            TimerState::Idle { remaining_seconds } => remaining_seconds,
            TimerState::Running { end_at } => self.remaining_until(end_at),
            TimerState::Expired => 0,
        }
    }

    /// Picks another length. Only allowed while not running, returns false when rejected.
    pub fn select_length(&mut self, length: SessionLength) -> bool {
        if self.is_running() {
            debug!("Ignoring length change to {length} while running");
            return false;
        }
        self.length = length;
        self.state = TimerState::Idle {
            remaining_seconds: length.seconds(),
        };
        true
    }

    /// Starts or resumes. Continues from the paused remaining time when there is some, otherwise
    /// runs the full length. Returns false if already running.
    pub fn start(&mut self) -> bool {
        let seconds = match self.state {
            TimerState::Running { .. } => return false,
            TimerState::Idle { remaining_seconds } if remaining_seconds > 0 => remaining_seconds,
            TimerState::Idle { .. } | TimerState::Expired => self.length.seconds(),
        };
        let end_at = self.clock.time() + Duration::seconds(seconds as i64);
        info!("Starting timer for {seconds}s");
        self.state = TimerState::Running { end_at };
        self.finish_reported = false;
        true
    }

    /// Freezes the remaining time and drops the anchor. Refused when not running, and when the
    /// run already reached zero so that the finish isn't lost.
    pub fn pause(&mut self) -> bool {
        let TimerState::Running { end_at } = self.state else {
            return false;
        };
        let remaining_seconds = self.remaining_until(end_at);
        if remaining_seconds == 0 {
            return false;
        }
        info!("Pausing timer with {remaining_seconds}s left");
        self.state = TimerState::Idle { remaining_seconds };
        true
    }

    /// Cancels any run and goes back to the full selected length.
    pub fn reset(&mut self) {
        self.state = TimerState::Idle {
            remaining_seconds: self.length.seconds(),
        };
        self.finish_reported = false;
    }

    /// Recomputes the timer against the clock. Safe to call as often as needed, a run reports
    /// [Tick::Finished] exactly once.
    pub fn tick(&mut self) -> Tick {
        match self.state {
            TimerState::Idle { remaining_seconds } => Tick::Idle { remaining_seconds },
            TimerState::Running { end_at } => match self.remaining_until(end_at) {
                0 => {
                    self.state = TimerState::Expired;
                    self.take_finish()
                }
                remaining_seconds => Tick::Running { remaining_seconds },
            },
            TimerState::Expired => self.take_finish(),
        }
    }

    fn take_finish(&mut self) -> Tick {
        if self.finish_reported {
            Tick::Expired
        } else {
            self.finish_reported = true;
            info!("Timer finished");
            Tick::Finished
        }
    }
}
