use anyhow::Result;
use chrono::Local;
use clap::Parser;

use crate::utils::time::DayId;

use super::{
    dates::{parse_moment, DateStyle},
    output::{calendar_grid::render_month, format_summary, summary::summarize_month},
    Store,
};

#[derive(Debug, Parser)]
pub struct CalendarCommand {
    #[arg(
        long,
        short,
        help = "Any day of the month to show. Examples are \"last month\", \"15/03/2025\", \"3 weeks ago\". Defaults to the current month"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Command to process `calendar`. Prints the month grid followed by the month's numbers.
pub async fn process_calendar_command(
    CalendarCommand { date, date_style }: CalendarCommand,
    store: &Store,
) -> Result<()> {
    let now = Local::now();
    let month = match date {
        Some(date) => parse_moment(&date, now, date_style)?,
        None => now,
    };

    let records = store.get_all_days().await;

    println!("{}", render_month(&month, &records, DayId::from_instant(&now)));
    println!();
    println!("{}", format_summary(&summarize_month(&records, &month)));
    Ok(())
}
