//! Diary stores: where entries are read from and written to.
//!
//! [`DiaryStore`] is the capability set every caller uses. Two
//! implementations exist:
//!
//! - [`GuestStore`]: local storage, synchronous, no network.
//! - [`RemoteStore`]: the remote API behind an [`EntryCache`], with
//!   optimistic writes that roll back on failure.
//!
//! [`open_store`] picks one from the identity once; callers never branch on
//! the identity themselves.

mod cache;
mod error;
mod guest;
mod local;
mod remote;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::HttpDiaryApi;
use crate::identity::Identity;
use crate::models::{DiaryEntry, EntryPatch, FoodEntry, ListName, NewFoodEntry};

pub use cache::{EntryCache, EntryView, FetchOutcome, FetchResult, FetchTicket, QueryStatus, WriteSeq};
pub use error::{DiaryError, StorageError};
pub use guest::GuestStore;
pub use local::LocalStorage;
pub use remote::RemoteStore;

/// Read and write access to diary entries.
#[async_trait]
pub trait DiaryStore: Send + Sync {
    /// True for the local-storage variant.
    fn is_guest(&self) -> bool;

    /// Current view of `date` without starting a fetch.
    fn peek(&self, date: NaiveDate) -> EntryView;

    /// Reads `date`, fetching when the cached value is missing or stale.
    async fn read(&self, date: NaiveDate) -> Result<EntryView, DiaryError>;

    /// Merges `patch` into the visible entry before it is committed.
    ///
    /// Returns the id of this write; pass it to the matching `commit`.
    fn apply_optimistic(&self, date: NaiveDate, patch: &EntryPatch) -> WriteSeq;

    /// Persists `patch`, settling the optimistic write `write`.
    async fn commit(
        &self,
        date: NaiveDate,
        patch: EntryPatch,
        write: WriteSeq,
    ) -> Result<DiaryEntry, DiaryError>;

    /// Appends a food to the end of `list`.
    async fn add_food(
        &self,
        date: NaiveDate,
        list: ListName,
        food: NewFoodEntry,
    ) -> Result<DiaryEntry, DiaryError>;

    /// Removes the foods with `ids` from both lists, keeping the order of the rest.
    async fn remove_foods(&self, date: NaiveDate, ids: &[String])
        -> Result<DiaryEntry, DiaryError>;

    /// Marks `date` for re-synchronization on the next read.
    fn invalidate(&self, date: NaiveDate);

    /// Ignores the result of any read of `date` still in flight.
    fn cancel(&self, date: NaiveDate);

    /// Optimistic update followed by commit.
    async fn update(&self, date: NaiveDate, patch: EntryPatch) -> Result<DiaryEntry, DiaryError> {
        let write = self.apply_optimistic(date, &patch);
        self.commit(date, patch, write).await
    }

    /// Moves food `id` to the end of list `to`.
    async fn move_food(
        &self,
        date: NaiveDate,
        id: &str,
        to: ListName,
    ) -> Result<DiaryEntry, DiaryError> {
        let current = self.read(date).await?.entry;
        let patch = current
            .with_food_moved(id, to)
            .ok_or_else(|| DiaryError::FoodNotFound(id.to_string()))?;
        self.update(date, patch).await
    }

    /// Replaces both lists with a reordered version of themselves.
    async fn reorder(
        &self,
        date: NaiveDate,
        eaten: Vec<FoodEntry>,
        to_eat: Vec<FoodEntry>,
    ) -> Result<DiaryEntry, DiaryError> {
        self.update(date, EntryPatch::lists(eaten, to_eat)).await
    }
}

/// Opens the store that matches `identity`.
pub fn open_store(identity: &Identity, data_dir: PathBuf) -> Arc<dyn DiaryStore> {
    match identity {
        Identity::Guest => {
            tracing::debug!("Using guest diary in {}", data_dir.display());
            Arc::new(GuestStore::new(LocalStorage::new(data_dir)))
        }
        Identity::Authenticated {
            server_url,
            api_key,
        } => {
            tracing::debug!("Using remote diary at {}", server_url);
            let api = HttpDiaryApi::new(server_url.clone(), api_key.clone());
            Arc::new(RemoteStore::new(Arc::new(api)))
        }
    }
}
