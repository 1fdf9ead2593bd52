//! Storage module for persisting collected listings
//!
//! The crawler writes every new, relevant listing to a `Sink`. The SQLite
//! implementation keys rows on the listing's identity key, so repeated
//! writes of the same listing update a single row.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteSink;
pub use traits::{Sink, StorageError, StorageResult};

use crate::HarvestError;
use std::path::Path;

/// Opens (or creates) the listing database
pub fn open_sink(path: &Path) -> Result<SqliteSink, HarvestError> {
    SqliteSink::new(path)
}

/// One scraped listing
///
/// Extractors fill `identity_key` with the raw detail link; the crawler
/// replaces it with the canonical key before dedup and storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemRecord {
    pub identity_key: String,
    pub title: String,
    pub organization: String,
    pub locality: String,
    pub compensation: String,
    pub work_mode: String,
    pub description: String,
    pub source: String,
    /// Search keyword whose results first produced this listing
    pub keyword: String,
}

impl ItemRecord {
    /// Creates a record with a link and title, other fields empty
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identity_key: link.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}
