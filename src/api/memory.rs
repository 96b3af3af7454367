//! In-process stand-in for the diary API, with knobs for latency and failure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{ApiError, DiaryApi};
use crate::models::{DiaryEntry, EntryPatch, FoodEntry, ListName, NewFoodEntry};

#[derive(Default)]
pub(crate) struct MemoryDiaryApi {
    entries: Mutex<HashMap<NaiveDate, DiaryEntry>>,
    read_delays: Mutex<HashMap<NaiveDate, Duration>>,
    write_delay: Mutex<Duration>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    next_id: AtomicUsize,
}

impl MemoryDiaryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server-side state, bypassing the API.
    pub fn put(&self, date: NaiveDate, entry: DiaryEntry) {
        self.entries.lock().unwrap().insert(date, entry);
    }

    pub fn stored(&self, date: NaiveDate) -> Option<DiaryEntry> {
        self.entries.lock().unwrap().get(&date).cloned()
    }

    /// Reads of `date` answer with the value seen when the request arrived,
    /// after `delay`.
    pub fn set_read_delay(&self, date: NaiveDate, delay: Duration) {
        self.read_delays.lock().unwrap().insert(date, delay);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Waits out the write latency, then fails or runs `write` on the entry.
    async fn write<F>(&self, date: NaiveDate, write: F) -> Result<DiaryEntry, ApiError>
    where
        F: FnOnce(&mut DiaryEntry),
    {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.write_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApiError::Request("connection reset".to_string()));
        }
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(date).or_default();
        write(entry);
        Ok(entry.clone())
    }
}

#[async_trait]
impl DiaryApi for MemoryDiaryApi {
    async fn get_entry(&self, date: NaiveDate) -> Result<Option<DiaryEntry>, ApiError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.stored(date);
        let delay = self.read_delays.lock().unwrap().get(&date).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ApiError::Status(503));
        }
        Ok(snapshot)
    }

    async fn add_food(
        &self,
        date: NaiveDate,
        list: ListName,
        food: &NewFoodEntry,
    ) -> Result<DiaryEntry, ApiError> {
        let id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let food = food.clone();
        self.write(date, move |entry| {
            entry.list_mut(list).push(FoodEntry {
                id,
                chosen_food: food.food,
                chosen_options: food.chosen_options,
            });
        })
        .await
    }

    async fn update_entry(
        &self,
        date: NaiveDate,
        patch: &EntryPatch,
    ) -> Result<DiaryEntry, ApiError> {
        self.write(date, |entry| entry.apply(patch)).await
    }

    async fn remove_foods(&self, date: NaiveDate, ids: &[String]) -> Result<DiaryEntry, ApiError> {
        self.write(date, |entry| {
            let patch = entry.without_foods(ids);
            entry.apply(&patch);
        })
        .await
    }
}
