use chrono::Datelike;

use crate::{
    storage::entities::DayRecord,
    utils::time::{start_of_month, DayId},
};

/// Completed sessions of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthSummary {
    pub sessions: u32,
    pub minutes: u32,
    /// Minutes per session, rounded to the nearest minute.
    pub average: u32,
}

pub fn summarize_month(records: &[DayRecord], month: &impl Datelike) -> MonthSummary {
    let key = DayId::new(start_of_month(month)).month_key();
    let (sessions, minutes) = records
        .iter()
        .filter(|r| r.completed && r.day.month_key() == key)
        .fold((0u32, 0u32), |(sessions, minutes), r| {
            (sessions + 1, minutes.saturating_add(r.minutes))
        });

    let average = if sessions > 0 {
        (minutes as f64 / sessions as f64).round() as u32
    } else {
        0
    };

    MonthSummary {
        sessions,
        minutes,
        average,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::storage::entities::DayRecord;

    use super::{summarize_month, MonthSummary};

    fn record(day: &str, minutes: u32, completed: bool) -> DayRecord {
        DayRecord {
            day: day.parse().unwrap(),
            minutes,
            completed,
            updated_at: 0,
        }
    }

    #[test]
    fn test_only_completed_days_of_the_month_count() {
        let records = vec![
            record("2024-01-31", 20, true),
            record("2024-02-01", 10, true),
            record("2024-02-02", 15, true),
            record("2024-02-03", 5, false),
            record("2024-02-29", 10, true),
            record("2023-02-10", 20, true),
        ];
        let month = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();

        assert_eq!(
            summarize_month(&records, &month),
            MonthSummary {
                sessions: 3,
                minutes: 35,
                average: 12,
            }
        );
    }

    #[test]
    fn test_empty_month() {
        let month = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();
        assert_eq!(summarize_month(&[], &month), MonthSummary::default());
    }
}
