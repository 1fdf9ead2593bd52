//! Crawler module for listing page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP transport and the fetch adapter with retry logic
//! - Politeness delays between requests
//! - Listing and detail page extraction
//! - Relevance filtering and progress estimation
//! - Overall crawl orchestration

mod coordinator;
mod fetcher;
mod parser;
pub mod progress;
mod rate_limiter;
mod relevance;
mod transport;

pub use coordinator::{Orchestrator, RunOutcome, StopReason};
pub use fetcher::PageFetcher;
pub use parser::{
    build_extractor, ComputrabajoExtractor, ExtractionError, Extractor, ListingPage, OccExtractor,
    NOT_AVAILABLE,
};
pub use progress::{estimate, ProgressEstimate, RunStats};
pub use rate_limiter::{DelayRange, RateLimiter, RequestKind};
pub use relevance::{AcceptAll, KeywordRelevance, RelevancePredicate};
pub use transport::{
    build_http_client, ReqwestTransport, Transport, TransportError, TransportResponse,
};

use crate::config::Config;
use crate::HarvestError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the listing database and checkpoint
/// 2. Build the HTTP transport and extractor
/// 3. Walk the keyword × page plan until a stop condition fires
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Ignore any saved checkpoint
/// * `token` - Stops the run at the next page boundary when cancelled
pub async fn crawl(
    config: &Config,
    fresh: bool,
    token: CancellationToken,
) -> Result<RunOutcome, HarvestError> {
    let mut orchestrator = Orchestrator::from_config(config)?.fresh(fresh);
    orchestrator.run(token).await
}
