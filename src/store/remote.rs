//! Authenticated diary: the remote API behind an [`EntryCache`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::cache::{EntryCache, EntryView, FetchOutcome, FetchTicket, WriteSeq};
use super::error::DiaryError;
use super::DiaryStore;
use crate::api::{ApiError, DiaryApi};
use crate::models::{DiaryEntry, EntryPatch, ListName, NewFoodEntry};

/// Diary store backed by the remote API.
///
/// Writes show up in the cache before the server answers. When a write
/// settles the entry is marked stale so the next read re-synchronizes; when
/// it fails the cache is first restored to the state before the write.
pub struct RemoteStore {
    api: Arc<dyn DiaryApi>,
    cache: Arc<EntryCache>,
}

impl RemoteStore {
    pub fn new(api: Arc<dyn DiaryApi>) -> Self {
        Self::with_cache(api, Arc::new(EntryCache::new()))
    }

    /// Creates a store sharing an existing cache.
    pub fn with_cache(api: Arc<dyn DiaryApi>, cache: Arc<EntryCache>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<EntryCache> {
        &self.cache
    }

    fn settle(
        &self,
        date: NaiveDate,
        write_seq: WriteSeq,
        result: Result<DiaryEntry, ApiError>,
    ) -> Result<DiaryEntry, DiaryError> {
        match result {
            Ok(entry) => {
                self.cache.settle(date, write_seq, true);
                Ok(entry)
            }
            Err(e) => {
                if self.cache.settle(date, write_seq, false) {
                    tracing::warn!("Write for {} failed, rolled back: {}", date, e);
                } else {
                    tracing::warn!("Write for {} failed: {}", date, e);
                }
                Err(DiaryError::NetworkFailure(e))
            }
        }
    }
}

/// Releases a led fetch if its reader goes away before landing it.
struct LeadGuard<'a> {
    cache: &'a EntryCache,
    date: NaiveDate,
    generation: u64,
}

impl Drop for LeadGuard<'_> {
    fn drop(&mut self) {
        self.cache.release_fetch(self.date, self.generation);
    }
}

#[async_trait]
impl DiaryStore for RemoteStore {
    fn is_guest(&self) -> bool {
        false
    }

    fn peek(&self, date: NaiveDate) -> EntryView {
        self.cache.peek(date).unwrap_or_else(EntryView::loading)
    }

    /// Concurrent reads of one date share a single fetch. A reader whose
    /// fetch is cancelled or overtaken by a write reads again, so it never
    /// returns a view that is still loading.
    async fn read(&self, date: NaiveDate) -> Result<EntryView, DiaryError> {
        loop {
            if let Some(view) = self.cache.fresh(date) {
                return Ok(view);
            }

            match self.cache.begin_fetch(date) {
                FetchTicket::Lead(generation) => {
                    let _guard = LeadGuard {
                        cache: &self.cache,
                        date,
                        generation,
                    };
                    let result = self.api.get_entry(date).await;
                    match self.cache.finish_fetch(date, generation, &result) {
                        FetchOutcome::Stored(view) => {
                            return result.map(|_| view).map_err(DiaryError::NetworkFailure)
                        }
                        FetchOutcome::Discarded => {
                            tracing::debug!("Read of {} superseded, reading again", date);
                        }
                    }
                }
                FetchTicket::Join(mut landed) => {
                    // A closed channel means the fetch was abandoned.
                    let _ = landed.changed().await;
                    let shared = landed.borrow().clone();
                    if let Some(result) = shared {
                        return result.map_err(DiaryError::NetworkFailure);
                    }
                }
            }
        }
    }

    fn apply_optimistic(&self, date: NaiveDate, patch: &EntryPatch) -> WriteSeq {
        self.cache.apply_optimistic(date, patch)
    }

    async fn commit(
        &self,
        date: NaiveDate,
        patch: EntryPatch,
        write: WriteSeq,
    ) -> Result<DiaryEntry, DiaryError> {
        let result = self.api.update_entry(date, &patch).await;
        self.settle(date, write, result)
    }

    async fn add_food(
        &self,
        date: NaiveDate,
        list: ListName,
        food: NewFoodEntry,
    ) -> Result<DiaryEntry, DiaryError> {
        let entry = self.api.add_food(date, list, &food).await?;
        self.cache.invalidate(date);
        Ok(entry)
    }

    async fn remove_foods(
        &self,
        date: NaiveDate,
        ids: &[String],
    ) -> Result<DiaryEntry, DiaryError> {
        let current = self.peek(date);
        if !current.is_success() {
            // Lists not known yet; an optimistic patch would blank them.
            let entry = self.api.remove_foods(date, ids).await?;
            self.cache.invalidate(date);
            return Ok(entry);
        }

        let patch = current.entry.without_foods(ids);
        let write_seq = self.cache.apply_optimistic(date, &patch);
        let result = self.api.remove_foods(date, ids).await;
        self.settle(date, write_seq, result)
    }

    fn invalidate(&self, date: NaiveDate) {
        self.cache.invalidate(date);
    }

    fn cancel(&self, date: NaiveDate) {
        self.cache.cancel(date);
    }
}
