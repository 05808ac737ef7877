use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Identifier of a calendar day. This is the standard way of naming a day in medit-streak, both on
/// disk and in the terminal, rendered as `YYYY-MM-DD`.
///
/// Ordering is chronological, which is also the lexicographic order of the rendered form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayId(NaiveDate);

impl DayId {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Calendar day of `instant` in the timezone the instant carries. The zone does the
    /// calendar resolution, so DST transitions never shift the day.
    pub fn from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self(instant.date_naive())
    }

    /// Calendar day of `instant` on this device.
    pub fn local<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self::from_instant(&instant.with_timezone(&Local))
    }

    /// Returns the day `delta` whole days away. Arithmetic is done on the calendar date, so month
    /// and year rollover come for free. Saturates at the ends of the supported calendar
    /// ([NaiveDate::MIN] and [NaiveDate::MAX], roughly 262000 years either way), so moving by `n`
    /// and back by `-n` only returns the original day while the first move stays inside it.
    pub fn add_days(self, delta: i64) -> Self {
        let days = Days::new(delta.unsigned_abs());
        let moved = if delta >= 0 {
            self.0.checked_add_days(days).unwrap_or(NaiveDate::MAX)
        } else {
            self.0.checked_sub_days(days).unwrap_or(NaiveDate::MIN)
        };
        Self(moved)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `YYYY-MM` of the month this day belongs to.
    pub fn month_key(&self) -> String {
        self.0.format("%Y-%m").to_string()
    }

    pub fn day_of_month(&self) -> u32 {
        self.0.day()
    }
}

impl Display for DayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl FromStr for DayId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)
            .map(Self)
            .map_err(|e| anyhow!("Can't parse {s} into a day, expected YYYY-MM-DD: {e}"))
    }
}

impl From<NaiveDate> for DayId {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

// Serialized as a plain string so it can also act as a json object key.
impl Serialize for DayId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Renders the local calendar day of `instant` as `YYYY-MM-DD`.
pub fn to_day_string<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    DayId::local(instant).to_string()
}

/// Moves a `YYYY-MM-DD` day identifier by `delta` days. Saturates like [DayId::add_days].
pub fn add_days(day: &str, delta: i64) -> anyhow::Result<String> {
    Ok(day.parse::<DayId>()?.add_days(delta).to_string())
}

/// First day of the month `date` falls into.
pub fn start_of_month(date: &impl Datelike) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("The first day of an existing month should always exist")
}

pub fn days_in_month(date: &impl Datelike) -> u32 {
    let first = start_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .map(|next| next.signed_duration_since(first).num_days() as u32)
        // Only December of the last representable year gets here.
        .unwrap_or(31)
}

/// 0 = Monday ... 6 = Sunday
pub fn weekday_index_monday_first(date: &impl Datelike) -> u32 {
    date.weekday().num_days_from_monday()
}
