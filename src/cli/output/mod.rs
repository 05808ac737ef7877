pub mod calendar_grid;
pub mod summary;

use summary::MonthSummary;

use crate::storage::entities::DayRecord;

/// `mm:ss`, minutes keep growing past an hour.
pub fn format_seconds(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn format_record(record: &DayRecord) -> String {
    format!(
        "{}\t{}\t{} min",
        record.day,
        if record.completed { "done" } else { "-" },
        record.minutes
    )
}

pub fn format_summary(summary: &MonthSummary) -> String {
    format!(
        "Sessions: {}\tMinutes: {}\tAverage: {} min/session",
        summary.sessions, summary.minutes, summary.average
    )
}

pub fn format_streak(streak: u32) -> String {
    match streak {
        1 => "Streak: 1 day".to_string(),
        n => format!("Streak: {n} days"),
    }
}

#[cfg(test)]
mod tests {
    use super::{format_record, format_seconds, format_streak};
    use crate::storage::entities::DayRecord;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0), "00:00");
        assert_eq!(format_seconds(65), "01:05");
        assert_eq!(format_seconds(600), "10:00");
        assert_eq!(format_seconds(7200), "120:00");
    }

    #[test]
    fn test_format_record() {
        let record = DayRecord::completed("2024-01-02".parse().unwrap(), 15, 0);
        assert_eq!(format_record(&record), "2024-01-02\tdone\t15 min");
    }

    #[test]
    fn test_format_streak() {
        assert_eq!(format_streak(0), "Streak: 0 days");
        assert_eq!(format_streak(1), "Streak: 1 day");
    }
}
