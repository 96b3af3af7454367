//! Guest diary: entries live in local storage under `entry-{date}`.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::cache::{EntryView, QueryStatus, WriteSeq};
use super::error::{DiaryError, StorageError};
use super::local::LocalStorage;
use super::DiaryStore;
use crate::models::{DiaryEntry, EntryPatch, FoodEntry, ListName, NewFoodEntry};

/// Storage key for the entry of `date`.
pub fn entry_key(date: NaiveDate) -> String {
    format!("entry-{}", date.format("%Y-%m-%d"))
}

/// Diary store for guests. Every operation is a synchronous read or
/// overwrite of one local value, so nothing needs rolling back.
#[derive(Debug, Clone)]
pub struct GuestStore {
    storage: LocalStorage,
}

impl GuestStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Loads the entry for `date`; absent or corrupt values read as empty.
    fn load(&self, date: NaiveDate) -> Result<DiaryEntry, StorageError> {
        match self.storage.load::<DiaryEntry>(&entry_key(date)) {
            Ok(entry) => Ok(entry.unwrap_or_default()),
            Err(e @ StorageError::Parse(..)) => {
                tracing::error!("{}; using an empty entry", e);
                Ok(DiaryEntry::default())
            }
            Err(e) => Err(e),
        }
    }

    fn save(&self, date: NaiveDate, entry: &DiaryEntry) -> Result<(), StorageError> {
        self.storage.save(&entry_key(date), entry)
    }

    /// Loads, modifies and overwrites the entry for `date`.
    fn modify<F>(&self, date: NaiveDate, change: F) -> Result<DiaryEntry, DiaryError>
    where
        F: FnOnce(&mut DiaryEntry),
    {
        let mut entry = self.load(date)?;
        change(&mut entry);
        self.save(date, &entry)?;
        Ok(entry)
    }
}

#[async_trait]
impl DiaryStore for GuestStore {
    fn is_guest(&self) -> bool {
        true
    }

    fn peek(&self, date: NaiveDate) -> EntryView {
        match self.load(date) {
            Ok(entry) => EntryView::loaded(entry),
            Err(e) => {
                tracing::error!("Failed to read guest entry for {}: {}", date, e);
                EntryView {
                    entry: DiaryEntry::default(),
                    status: QueryStatus::Error,
                }
            }
        }
    }

    async fn read(&self, date: NaiveDate) -> Result<EntryView, DiaryError> {
        Ok(EntryView::loaded(self.load(date)?))
    }

    fn apply_optimistic(&self, _date: NaiveDate, _patch: &EntryPatch) -> WriteSeq {
        // The commit that follows is synchronous; there is nothing to show early.
        WriteSeq::default()
    }

    async fn commit(
        &self,
        date: NaiveDate,
        patch: EntryPatch,
        _write: WriteSeq,
    ) -> Result<DiaryEntry, DiaryError> {
        self.modify(date, |entry| entry.apply(&patch))
    }

    async fn add_food(
        &self,
        date: NaiveDate,
        list: ListName,
        food: NewFoodEntry,
    ) -> Result<DiaryEntry, DiaryError> {
        let item = FoodEntry::from_new(food);
        tracing::debug!("Adding {} to {} on {}", item.id, list, date);
        self.modify(date, |entry| entry.list_mut(list).push(item))
    }

    async fn remove_foods(
        &self,
        date: NaiveDate,
        ids: &[String],
    ) -> Result<DiaryEntry, DiaryError> {
        self.modify(date, |entry| {
            let patch = entry.without_foods(ids);
            entry.apply(&patch);
        })
    }

    fn invalidate(&self, _date: NaiveDate) {}

    fn cancel(&self, _date: NaiveDate) {}
}
