use std::collections::HashSet;

use ansi_term::{Colour, Style};
use chrono::Datelike;

use crate::{
    storage::entities::DayRecord,
    utils::time::{days_in_month, start_of_month, weekday_index_monday_first, DayId},
};

const WEEKDAYS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// Cells of a Monday-first month grid. Leading [None]s pad the first week so that the first day
/// lands under its weekday.
pub fn month_cells(month: &impl Datelike) -> Vec<Option<DayId>> {
    let first = DayId::new(start_of_month(month));
    let padding = weekday_index_monday_first(&first.date());
    let total = days_in_month(month);

    let mut cells = vec![None; padding as usize];
    cells.extend((0..total).map(|offset| Some(first.add_days(offset as i64))));
    cells
}

/// Renders the month as text. Completed days are highlighted, today is underlined.
pub fn render_month(month: &impl Datelike, records: &[DayRecord], today: DayId) -> String {
    let completed = records
        .iter()
        .filter(|r| r.completed)
        .map(|r| r.day)
        .collect::<HashSet<_>>();

    let title = start_of_month(month).format("%B %Y").to_string();
    let mut lines = vec![format!("{title:^20}"), WEEKDAYS.join(" ")];

    for week in month_cells(month).chunks(7) {
        let line = week
            .iter()
            .map(|cell| match cell {
                None => "  ".to_string(),
                Some(day) => {
                    let mut style = Style::new();
                    if completed.contains(day) {
                        style = style.fg(Colour::Black).on(Colour::Green);
                    }
                    if *day == today {
                        style = style.bold().underline();
                    }
                    style.paint(format!("{:>2}", day.day_of_month())).to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{month_cells, render_month};

    #[test]
    fn test_month_starting_on_thursday() {
        // February 2024 starts on a Thursday and has 29 days.
        let month = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        let cells = month_cells(&month);

        assert_eq!(cells.len(), 3 + 29);
        assert!(cells[..3].iter().all(Option::is_none));
        assert_eq!(cells[3].unwrap().to_string(), "2024-02-01");
        assert_eq!(cells.last().unwrap().unwrap().to_string(), "2024-02-29");
    }

    #[test]
    fn test_month_starting_on_monday() {
        let month = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let cells = month_cells(&month);

        assert_eq!(cells.len(), 31);
        assert_eq!(cells[0].unwrap().to_string(), "2024-01-01");
    }

    #[test]
    fn test_render_has_a_line_per_week() {
        let month = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        let rendered = render_month(&month, &[], "2024-02-20".parse().unwrap());
        let lines = rendered.lines().collect::<Vec<_>>();

        assert!(lines[0].contains("February 2024"));
        assert_eq!(lines[1], "Mo Tu We Th Fr Sa Su");
        // 32 cells make 5 weeks.
        assert_eq!(lines.len(), 2 + 5);
        assert!(lines[2].starts_with("         "));
    }
}
