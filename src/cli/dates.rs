use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use crate::utils::time::DayId;

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Parses expressions like "yesterday", "3 days ago" or "15/03/2025" relative to `now`.
pub fn parse_moment(
    input: &str,
    now: DateTime<Local>,
    date_style: DateStyle,
) -> Result<DateTime<Local>> {
    parse_date_string(input, now, date_style.into()).map_err(|e| {
        Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {input}: {e}"),
            )
            .into()
    })
}

/// Accepts `YYYY-MM-DD` first, then anything [parse_moment] understands. Missing input means
/// today.
pub fn parse_day(input: Option<&str>, now: DateTime<Local>, date_style: DateStyle) -> Result<DayId> {
    let Some(input) = input else {
        return Ok(DayId::from_instant(&now));
    };
    if let Ok(day) = input.parse::<DayId>() {
        return Ok(day);
    }
    parse_moment(input, now, date_style).map(|moment| DayId::from_instant(&moment))
}
