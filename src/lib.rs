//! Listing-Harvest: a resumable, deduplicating job-listing crawler
//!
//! This crate walks a finite keyword × page grid on a paginated listing site,
//! deduplicates listings by a stable identity key across the whole run (and
//! across restarts), checkpoints after every page, and reports throughput/ETA.

pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Listing-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] crawler::TransportError),

    #[error("Fetch failed for '{keyword}' page {page}: {last_error}")]
    FetchFailed {
        keyword: String,
        page: u32,
        last_error: String,
    },

    #[error("Extraction error: {0}")]
    Extraction(#[from] crawler::ExtractionError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },

    #[error("Setup failed: {0}")]
    SetupFatal(String),
}

impl HarvestError {
    /// Returns true if this error must terminate the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SetupFatal(_) | Self::Config(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Placeholder or empty link: '{0}'")]
    Unresolvable(String),
}

/// Result type alias for Listing-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, CheckpointStore, JsonCheckpointStore};
pub use config::Config;
pub use crawler::{Orchestrator, RunOutcome, StopReason};
pub use state::{CrawlCell, CrawlCursor, CrawlPlan, DedupIndex, PlanExhausted, RunState};
pub use storage::{ItemRecord, Sink, SqliteSink};
pub use url::identity_key;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_and_config_errors_are_fatal() {
        assert!(HarvestError::SetupFatal("no database".to_string()).is_fatal());
        assert!(HarvestError::Config(ConfigError::Validation("no keywords".to_string())).is_fatal());
        assert!(!HarvestError::Storage(storage::StorageError::EmptyKey).is_fatal());
        assert!(!HarvestError::Extraction(crawler::ExtractionError::EmptyContent).is_fatal());
    }
}
