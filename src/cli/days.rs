use anyhow::Result;
use chrono::Local;
use tracing::{debug, warn};

use crate::{
    storage::{
        day_store::{DayStore, UpsertOutcome},
        error::StorageError,
        key_value::KeyValueStore,
    },
    streak::compute_streak,
    timer::session::SessionLength,
    utils::time::DayId,
};

use super::{
    dates::{parse_day, DateStyle},
    output::{format_record, format_streak, format_summary, summary::summarize_month},
    Store,
};

/// Command to process `status`. Shows the streak, today and the running month.
pub async fn process_status(store: &Store) -> Result<()> {
    let now = Local::now();
    let today = DayId::from_instant(&now);
    let records = store.get_all_days().await;

    println!("{}", format_streak(compute_streak(&records, &now)));
    match records.iter().find(|r| r.day == today) {
        Some(record) if record.completed => println!("Today: done ({} min)", record.minutes),
        Some(_) | None => println!("Today: not yet"),
    }
    println!(
        "This month\t{}",
        format_summary(&summarize_month(&records, &now))
    );
    Ok(())
}

pub async fn process_days_command(store: &Store, json: bool) -> Result<()> {
    let records = store.get_all_days().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No days recorded yet");
    }
    for record in records {
        println!("{}", format_record(&record));
    }
    Ok(())
}

pub async fn process_toggle(
    store: &Store,
    day: Option<&str>,
    minutes_if_new: SessionLength,
    date_style: DateStyle,
) -> Result<()> {
    let day = parse_day(day, Local::now(), date_style)?;
    println!("{}", toggle_day(store, day, minutes_if_new).await);
    Ok(())
}

pub async fn process_set_minutes(
    store: &Store,
    day: Option<&str>,
    minutes: SessionLength,
    date_style: DateStyle,
) -> Result<()> {
    let day = parse_day(day, Local::now(), date_style)?;
    println!("{}", set_day_minutes(store, day, minutes).await);
    Ok(())
}

/// Flips `day` and describes the record in effect afterwards.
async fn toggle_day<S: KeyValueStore>(
    store: &DayStore<S>,
    day: DayId,
    minutes_if_new: SessionLength,
) -> String {
    match store.toggle_complete(day, minutes_if_new.minutes()).await {
        Ok(record) => format_record(&record),
        Err(e) => {
            log_not_saved(day, &e);
            describe_day(store, day).await
        }
    }
}

/// Changes the minutes of `day` and describes the record in effect afterwards. A newer stored
/// record silently wins.
async fn set_day_minutes<S: KeyValueStore>(
    store: &DayStore<S>,
    day: DayId,
    minutes: SessionLength,
) -> String {
    match store.set_minutes(day, minutes.minutes()).await {
        Ok(UpsertOutcome::Written) => debug!("Set {day} to {minutes}"),
        Ok(UpsertOutcome::Stale) => debug!("{day} has a newer record, keeping it"),
        Err(e) => log_not_saved(day, &e),
    }
    describe_day(store, day).await
}

async fn describe_day<S: KeyValueStore>(store: &DayStore<S>, day: DayId) -> String {
    match store.get_day(day).await {
        Some(record) => format_record(&record),
        None => format!("{day}\t-\tnothing recorded"),
    }
}

/// Storage failures don't stop the flow, the change is just lost.
fn log_not_saved(day: DayId, e: &StorageError) {
    if e.is_unavailable() {
        debug!("Change for {day} dropped, no storage");
    } else {
        warn!("Change for {day} was not saved: {e}");
    }
}
