//! In-memory cache of diary entries keyed by date.
//!
//! Each cached date carries its last-known entry, a query status, a stale
//! flag, a fetch generation and at most one rollback snapshot:
//!
//! - At most one fetch per date is in flight. The first reader leads it and
//!   records the generation it started under; later readers join it and
//!   receive the same result.
//! - A fetch result is stored only if the generation is unchanged when it
//!   lands. `cancel` and `apply_optimistic` bump the generation and release
//!   any joined readers, so late responses are dropped.
//! - `apply_optimistic` replaces the snapshot with the state just before the
//!   new write and tags it with the write's [`WriteSeq`]. Only settling that
//!   same write restores (on failure) or clears the snapshot.
//!
//! The map lock is never held across an await, so each method is atomic but
//! a write's optimistic step and its settle are not.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tokio::sync::watch;

use crate::api::ApiError;
use crate::models::{DiaryEntry, EntryPatch};

/// Where a cached query stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No data has been loaded yet; a fetch is outstanding or about to start.
    Loading,
    Success,
    /// The last fetch failed; the entry still holds the last-known data.
    Error,
}

/// What a reader sees for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryView {
    pub entry: DiaryEntry,
    pub status: QueryStatus,
}

impl EntryView {
    pub fn loaded(entry: DiaryEntry) -> Self {
        Self {
            entry,
            status: QueryStatus::Success,
        }
    }

    pub fn loading() -> Self {
        Self {
            entry: DiaryEntry::default(),
            status: QueryStatus::Loading,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

/// Identifies one optimistic write on a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSeq(u64);

/// What a joined reader receives once the shared fetch lands.
pub type FetchResult = Result<EntryView, ApiError>;

/// How a reader takes part in fetching a date.
#[derive(Debug)]
pub enum FetchTicket {
    /// This reader performs the fetch and lands it with `finish_fetch`
    /// under the given generation.
    Lead(u64),
    /// Another reader's fetch is in flight. The channel yields its result,
    /// or closes without one if the fetch is cancelled.
    Join(watch::Receiver<Option<FetchResult>>),
}

#[derive(Debug, Clone)]
struct Rollback {
    write_seq: WriteSeq,
    snapshot: DiaryEntry,
}

#[derive(Debug)]
struct CacheEntry {
    data: DiaryEntry,
    status: QueryStatus,
    stale: bool,
    fetch_generation: u64,
    write_seq: u64,
    rollback: Option<Rollback>,
    /// Sender of the fetch in flight, if any.
    in_flight: Option<watch::Sender<Option<FetchResult>>>,
}

impl CacheEntry {
    fn new() -> Self {
        Self {
            data: DiaryEntry::default(),
            status: QueryStatus::Loading,
            stale: true,
            fetch_generation: 0,
            write_seq: 0,
            rollback: None,
            in_flight: None,
        }
    }

    /// Drops the fetch in flight; its joined readers see the channel close.
    fn abandon_fetch(&mut self) {
        self.fetch_generation += 1;
        self.in_flight = None;
    }

    fn view(&self) -> EntryView {
        EntryView {
            entry: self.data.clone(),
            status: self.status,
        }
    }
}

/// Result of landing a fetch in the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The response was stored.
    Stored(EntryView),
    /// The fetch was superseded or cancelled; the cache was not touched.
    Discarded,
}

/// Date-keyed entry cache with optimistic writes and rollback.
#[derive(Debug, Default)]
pub struct EntryCache {
    entries: Mutex<HashMap<NaiveDate, CacheEntry>>,
}

impl EntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NaiveDate, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current view of `date`, if the date has ever been read or written.
    pub fn peek(&self, date: NaiveDate) -> Option<EntryView> {
        self.lock().get(&date).map(CacheEntry::view)
    }

    /// The cached view when it is loaded and not stale.
    pub fn fresh(&self, date: NaiveDate) -> Option<EntryView> {
        self.lock()
            .get(&date)
            .filter(|entry| !entry.stale && entry.status == QueryStatus::Success)
            .map(CacheEntry::view)
    }

    /// Starts a fetch for `date`, or joins the one already in flight.
    pub fn begin_fetch(&self, date: NaiveDate) -> FetchTicket {
        let mut entries = self.lock();
        let entry = entries.entry(date).or_insert_with(CacheEntry::new);
        if let Some(in_flight) = &entry.in_flight {
            return FetchTicket::Join(in_flight.subscribe());
        }
        let (sender, _) = watch::channel(None);
        entry.in_flight = Some(sender);
        entry.fetch_generation += 1;
        FetchTicket::Lead(entry.fetch_generation)
    }

    /// Lands a fetch result. `Ok(None)` (not found) stores the empty entry.
    ///
    /// A failed fetch keeps the last-known data, sets `Error` and leaves the
    /// entry stale so the next read retries.
    pub fn finish_fetch(
        &self,
        date: NaiveDate,
        generation: u64,
        result: &Result<Option<DiaryEntry>, ApiError>,
    ) -> FetchOutcome {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&date) else {
            return FetchOutcome::Discarded;
        };
        if entry.fetch_generation != generation {
            tracing::debug!("Discarding superseded fetch for {}", date);
            return FetchOutcome::Discarded;
        }
        let shared = match result {
            Ok(data) => {
                entry.data = data.clone().unwrap_or_default();
                entry.status = QueryStatus::Success;
                entry.stale = false;
                Ok(entry.view())
            }
            Err(e) => {
                tracing::debug!("Fetch for {} failed: {}", date, e);
                entry.status = QueryStatus::Error;
                entry.stale = true;
                Err(e.clone())
            }
        };
        if let Some(in_flight) = entry.in_flight.take() {
            in_flight.send_replace(Some(shared));
        }
        FetchOutcome::Stored(entry.view())
    }

    /// Drops fetch `generation` if it never landed, releasing its joined
    /// readers. A fetch that did land, or a newer one, is left alone.
    pub fn release_fetch(&self, date: NaiveDate, generation: u64) {
        if let Some(entry) = self.lock().get_mut(&date) {
            if entry.fetch_generation == generation {
                entry.in_flight = None;
            }
        }
    }

    /// Makes any in-flight fetch for `date` land as discarded.
    pub fn cancel(&self, date: NaiveDate) {
        if let Some(entry) = self.lock().get_mut(&date) {
            entry.abandon_fetch();
        }
    }

    /// Marks `date` stale so the next read refetches it.
    pub fn invalidate(&self, date: NaiveDate) {
        if let Some(entry) = self.lock().get_mut(&date) {
            entry.stale = true;
        }
    }

    /// Snapshots `date`, cancels its in-flight fetch and merges `patch`.
    ///
    /// Returns the id of the write this snapshot belongs to; settle the
    /// write with it.
    pub fn apply_optimistic(&self, date: NaiveDate, patch: &EntryPatch) -> WriteSeq {
        let mut entries = self.lock();
        let entry = entries.entry(date).or_insert_with(CacheEntry::new);

        entry.abandon_fetch();
        entry.write_seq += 1;
        let write_seq = WriteSeq(entry.write_seq);
        entry.rollback = Some(Rollback {
            write_seq,
            snapshot: entry.data.clone(),
        });
        entry.data.apply(patch);

        write_seq
    }

    /// Settles write `write_seq` on `date` and marks the entry stale.
    ///
    /// When the write owns the retained snapshot, the snapshot is cleared,
    /// and on failure restored first. Returns true if a rollback happened.
    pub fn settle(&self, date: NaiveDate, write_seq: WriteSeq, succeeded: bool) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&date) else {
            return false;
        };
        entry.stale = true;

        let owns_snapshot = entry
            .rollback
            .as_ref()
            .is_some_and(|rollback| rollback.write_seq == write_seq);
        if !owns_snapshot {
            return false;
        }
        match entry.rollback.take() {
            Some(rollback) if !succeeded => {
                entry.data = rollback.snapshot;
                true
            }
            _ => false,
        }
    }

    /// Whether `date` holds a rollback snapshot for an unsettled write.
    pub fn has_pending_write(&self, date: NaiveDate) -> bool {
        self.lock()
            .get(&date)
            .is_some_and(|entry| entry.rollback.is_some())
    }
}
