//! Remote diary API.
//!
//! The store only depends on [`DiaryApi`]; [`HttpDiaryApi`] is the reqwest
//! implementation used against a real server.

mod http;
#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{DiaryEntry, EntryPatch, ListName, NewFoodEntry};

pub use http::HttpDiaryApi;

/// Errors from talking to the remote API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Diary endpoints consumed by the authenticated store.
///
/// Every write returns the entry as the server now holds it.
#[async_trait]
pub trait DiaryApi: Send + Sync {
    /// Fetches the entry for `date`. `Ok(None)` when the server has none.
    async fn get_entry(&self, date: NaiveDate) -> Result<Option<DiaryEntry>, ApiError>;

    /// Appends a food to the end of `list`; the server assigns its id.
    async fn add_food(
        &self,
        date: NaiveDate,
        list: ListName,
        food: &NewFoodEntry,
    ) -> Result<DiaryEntry, ApiError>;

    /// Applies a partial update (`note`, or `eaten` and `toEat`).
    async fn update_entry(&self, date: NaiveDate, patch: &EntryPatch)
        -> Result<DiaryEntry, ApiError>;

    /// Removes the foods with the given ids from both lists.
    async fn remove_foods(&self, date: NaiveDate, ids: &[String]) -> Result<DiaryEntry, ApiError>;
}
