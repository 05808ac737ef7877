//! Meditation timer. [session::TimerSession] is the countdown itself, anchored to the wall clock,
//! and [runner::SessionRunner] is the event loop that keeps it up to date and reports the end of
//! a run.

pub mod notifier;
pub mod runner;
pub mod session;
pub mod shutdown;
