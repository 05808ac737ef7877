use std::collections::HashSet;

use chrono::{DateTime, TimeZone};

use crate::{storage::entities::DayRecord, utils::time::DayId};

/// Counts consecutive completed days ending today.
///
/// A day that isn't completed yet is still in progress, so when today has no completion the count
/// is anchored at yesterday instead. Only one of the two is ever used as the anchor. The calendar
/// day of `today` is taken in the timezone it carries.
pub fn compute_streak<Tz: TimeZone>(records: &[DayRecord], today: &DateTime<Tz>) -> u32 {
    let completed = records
        .iter()
        .filter(|r| r.completed)
        .map(|r| r.day)
        .collect::<HashSet<_>>();

    let today = DayId::from_instant(today);
    let yesterday = today.add_days(-1);

    let mut day = if completed.contains(&today) {
        today
    } else if completed.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while completed.contains(&day) {
        streak += 1;
        day = day.add_days(-1);
    }
    streak
}
