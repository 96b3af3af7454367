//! Food diary client core.
//!
//! One [`DiaryEntry`](models::DiaryEntry) per calendar date, kept either in
//! local storage for guests or on a remote API behind an optimistic cache.
//! [`store::open_store`] picks the backing store from the [`identity::Identity`];
//! [`note::NoteCommitter`] saves the free-text note after a pause in typing.

pub mod api;
pub mod config;
pub mod identity;
pub mod models;
pub mod note;
pub mod store;
