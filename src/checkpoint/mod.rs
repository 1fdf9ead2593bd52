//! Checkpoint module for resumable crawls
//!
//! A checkpoint is a durable snapshot of run state: cursor position, every
//! identity key seen so far, per-page yield history and timing. It is
//! rewritten atomically after every processed page and loaded once at start.
//!
//! # Components
//!
//! - `Checkpoint`: the serializable snapshot
//! - `CheckpointStore` / `JsonCheckpointStore`: load and atomic save
//! - `CheckpointLedger`: merges per-keyword progress into the saved cursor

mod ledger;
mod store;

use crate::state::CrawlCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub use ledger::CheckpointLedger;
pub use store::{CheckpointStore, JsonCheckpointStore};

/// Checkpoint-specific errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Checkpoint is corrupt: {0}")]
    Corrupt(String),
}

/// Durable snapshot of a crawl run
///
/// `current_keyword`/`current_page` name the last fully processed cell
/// (both 0 before the first page). Every field is required when loading;
/// a file missing any of them is treated as corrupt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub total_items: u64,
    pub keywords_completed: u64,
    pub current_keyword: usize,
    pub current_page: u32,
    pub seen_links: BTreeSet<String>,
    /// Epoch seconds of the first run, kept across restarts
    pub start_time: f64,
    /// New items per processed page, append-only
    pub jobs_per_page: Vec<u64>,
    pub last_save_time: f64,
}

impl Checkpoint {
    /// Creates an empty checkpoint for a run starting at `now`
    pub fn fresh(now: f64) -> Self {
        Self {
            total_items: 0,
            keywords_completed: 0,
            current_keyword: 0,
            current_page: 0,
            seen_links: BTreeSet::new(),
            start_time: now,
            jobs_per_page: Vec::new(),
            last_save_time: now,
        }
    }

    /// The last fully processed cell, if any
    pub fn cursor(&self) -> Option<CrawlCell> {
        if self.current_keyword == 0 || self.current_page == 0 {
            None
        } else {
            Some(CrawlCell::new(self.current_keyword, self.current_page))
        }
    }

    /// Seconds since the run first started
    pub fn elapsed(&self, now: f64) -> f64 {
        (now - self.start_time).max(0.0)
    }

    /// Average new items per processed page
    pub fn average_yield(&self) -> f64 {
        if self.jobs_per_page.is_empty() {
            0.0
        } else {
            self.jobs_per_page.iter().sum::<u64>() as f64 / self.jobs_per_page.len() as f64
        }
    }

    /// Checks the invariants a loaded checkpoint must satisfy
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if (self.seen_links.len() as u64) < self.total_items {
            return Err(CheckpointError::Corrupt(format!(
                "claims {} items but stores only {} seen links",
                self.total_items,
                self.seen_links.len()
            )));
        }

        if (self.current_keyword == 0) != (self.current_page == 0) {
            return Err(CheckpointError::Corrupt(format!(
                "inconsistent cursor ({}, {})",
                self.current_keyword, self.current_page
            )));
        }

        if self.current_page == u32::MAX || self.current_keyword >= MAX_CURSOR_KEYWORD {
            return Err(CheckpointError::Corrupt(format!(
                "cursor ({}, {}) is out of range",
                self.current_keyword, self.current_page
            )));
        }

        if !self.start_time.is_finite() || !self.last_save_time.is_finite() {
            return Err(CheckpointError::Corrupt("non-finite timestamp".to_string()));
        }

        Ok(())
    }
}

/// Keyword indexes at or above this are never produced by a real plan
const MAX_CURSOR_KEYWORD: usize = u32::MAX as usize;

/// Current time in epoch seconds
pub fn now_epoch() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
