use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::utils::{clock::Clock, time::DayId};

use super::{entities::DayRecord, error::StorageError, key_value::KeyValueStore};

/// Key the whole collection is persisted under.
pub const DAYS_KEY: &str = "medit_streak_days_v1";

pub type DayMap = BTreeMap<DayId, DayRecord>;

/// What happened to a write offered to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Written,
    /// An existing record for the day has a newer `updated_at`. Nothing was saved.
    Stale,
}

/// Owner of every [DayRecord]. Records are loaded from the [KeyValueStore] on every call and saved
/// back after every accepted write, so callers never hold on to stored state.
pub struct DayStore<S: KeyValueStore> {
    storage: S,
    clock: Box<dyn Clock>,
}

impl<S: KeyValueStore> DayStore<S> {
    pub fn new(storage: S, clock: Box<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    async fn load(&self) -> Result<DayMap, StorageError> {
        let raw = self.storage.read(DAYS_KEY).await?;
        parse_days(raw.as_deref())
    }

    /// Corrupted or unreadable data counts as no data at all.
    async fn load_or_empty(&self) -> DayMap {
        self.load().await.unwrap_or_else(|e| {
            warn!("Ignoring stored day records: {e}");
            DayMap::new()
        })
    }

    /// All records, oldest day first. Never fails, see [DayStore::load_or_empty].
    pub async fn get_all_days(&self) -> Vec<DayRecord> {
        self.load_or_empty().await.into_values().collect()
    }

    pub async fn get_day(&self, day: DayId) -> Option<DayRecord> {
        self.load_or_empty().await.remove(&day)
    }

    /// Offers `record` to the store. It replaces the stored record for its day unless the stored
    /// one is strictly newer.
    pub async fn upsert_day(&self, record: DayRecord) -> Result<UpsertOutcome, StorageError> {
        let day = record.day;
        // Merged and saved under one lock.
        let outcome = self
            .storage
            .update(DAYS_KEY, move |raw| {
                let mut days = parse_days(raw.as_deref()).unwrap_or_else(|e| {
                    warn!("Replacing unreadable day records: {e}");
                    DayMap::new()
                });
                match merge_record(&mut days, record) {
                    UpsertOutcome::Written => {
                        Ok((Some(serde_json::to_string(&days)?), UpsertOutcome::Written))
                    }
                    UpsertOutcome::Stale => Ok((None, UpsertOutcome::Stale)),
                }
            })
            .await?;
        match outcome {
            UpsertOutcome::Written => info!("Saved record for {day}"),
            UpsertOutcome::Stale => debug!("Dropped stale write for {day}"),
        }
        Ok(outcome)
    }

    /// Changes the minutes of `day`, creating a not yet completed record when needed.
    pub async fn set_minutes(&self, day: DayId, minutes: u32) -> Result<UpsertOutcome, StorageError> {
        let now = self.clock.millis();
        let next = match self.get_day(day).await {
            Some(existing) => existing.with_minutes(minutes).with_updated_at(now),
            None => DayRecord {
                day,
                minutes,
                completed: false,
                updated_at: now,
            },
        };
        self.upsert_day(next).await
    }

    /// Flips completion of `day`. A day without a record becomes completed with
    /// `minutes_if_new`. Returns the record that is stored for the day afterwards.
    pub async fn toggle_complete(
        &self,
        day: DayId,
        minutes_if_new: u32,
    ) -> Result<DayRecord, StorageError> {
        let now = self.clock.millis();
        let existing = self.get_day(day).await;
        let next = match existing.clone() {
            Some(existing) => DayRecord {
                completed: !existing.completed,
                updated_at: now,
                ..existing
            },
            None => DayRecord::completed(day, minutes_if_new, now),
        };

        match self.upsert_day(next.clone()).await? {
            UpsertOutcome::Written => Ok(next),
            // The stored record is newer than our clock, it stays in effect.
            UpsertOutcome::Stale => Ok(existing.unwrap_or(next)),
        }
    }
}

/// Missing or blank data is an empty collection.
fn parse_days(raw: Option<&str>) -> Result<DayMap, StorageError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(raw)?),
        Some(_) | None => Ok(DayMap::new()),
    }
}

/// Last write wins. Ties go to the incoming record.
fn merge_record(days: &mut DayMap, record: DayRecord) -> UpsertOutcome {
    match days.get(&record.day) {
        Some(existing) if record.updated_at < existing.updated_at => UpsertOutcome::Stale,
        Some(_) | None => {
            days.insert(record.day, record);
            UpsertOutcome::Written
        }
    }
}
