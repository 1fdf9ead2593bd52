//! Storage traits and error types
//!
//! This module defines the sink interface the crawler writes listings to and
//! its error type.

use crate::storage::ItemRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Listing has an empty identity key")]
    EmptyKey,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append/upsert-by-key destination for collected listings
///
/// The crawler only calls `upsert` after the dedup index has confirmed the
/// key is new; implementations still key every write on `identity_key` so
/// that replays are idempotent.
pub trait Sink: Send {
    /// Inserts the listing, or updates the stored one with the same key
    fn upsert(&mut self, item: &ItemRecord) -> StorageResult<()>;

    /// Returns true if a listing with this key is stored
    fn exists_by_key(&self, key: &str) -> StorageResult<bool>;

    /// Number of stored listings
    fn count(&self) -> StorageResult<u64>;

    /// Every stored listing, oldest first
    fn all_items(&self) -> StorageResult<Vec<ItemRecord>>;

    /// Makes buffered writes durable
    fn flush(&mut self) -> StorageResult<()>;
}
