//! Meditation timer for the terminal that keeps a record of the days you sat and the streak they
//! add up to. Records live in a small json file next to the logs, nothing leaves the machine.
//!

pub mod cli;
pub mod fs;
pub mod storage;
pub mod streak;
pub mod timer;
pub mod utils;
