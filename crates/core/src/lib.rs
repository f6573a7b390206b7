#![warn(clippy::all, missing_docs)]

//! Core domain logic for HostCart, a personal video-game collection tracker.
//!
//! This crate hosts the data models, the collection store with its
//! validation rules, querying, JSON persistence and configuration handling
//! used by the command-line front end and any future frontends.

pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod persist;
pub mod playtime;
pub mod query;
pub mod store;

pub use collection::Collection;
pub use config::AppConfig;
pub use error::{StoreError, StoreResult};
pub use models::{EntryId, GameEntry, GameStatus, Platform, Rating};
pub use query::{CollectionSummary, ListQuery, SortKey};
pub use store::{CollectionStore, NewEntry};
