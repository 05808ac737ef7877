use serde::{Deserialize, Serialize};

use crate::utils::time::DayId;

/// What is stored for a single calendar day.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct DayRecord {
    pub day: DayId,
    /// Length of the session associated with the day, in minutes.
    pub minutes: u32,
    /// Set once a timer session for the day ran to completion.
    pub completed: bool,
    /// Milliseconds since the epoch. Only used for ordering writes to the same day.
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl DayRecord {
    /// Record written when a session for `day` finishes.
    pub fn completed(day: DayId, minutes: u32, updated_at: i64) -> Self {
        Self {
            day,
            minutes,
            completed: true,
            updated_at,
        }
    }

    pub fn with_minutes(self, minutes: u32) -> Self {
        Self { minutes, ..self }
    }

    pub fn with_updated_at(self, updated_at: i64) -> Self {
        Self { updated_at, ..self }
    }
}
