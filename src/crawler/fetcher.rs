//! Page fetch adapter
//!
//! This module wraps a transport with the crawler's fetch policy:
//! - Building listing and detail page URLs from the site templates
//! - A politeness delay before every attempt, including the first
//! - A hard per-request timeout
//! - A fixed attempt budget with a growing pause between failed attempts
//!
//! A listing page that fails every attempt is reported as
//! `HarvestError::FetchFailed`, which the orchestrator treats as a page-level
//! failure.

use crate::config::FetchConfig;
use crate::crawler::rate_limiter::{RateLimiter, RequestKind};
use crate::crawler::transport::{Transport, TransportError};
use crate::url::SiteUrls;
use crate::HarvestError;
use std::sync::Arc;
use std::time::Duration;

/// Fetches listing and detail pages through a transport
#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    urls: SiteUrls,
    headers: Vec<(String, String)>,
    timeout: Duration,
    max_attempts: u32,
    retry_delay: Duration,
    limiter: RateLimiter,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn Transport>, urls: SiteUrls, config: &FetchConfig) -> Self {
        Self {
            transport,
            urls,
            headers: default_headers(),
            timeout: Duration::from_secs(config.request_timeout),
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay),
            limiter: RateLimiter::from_config(config),
        }
    }

    /// Replaces the politeness delays
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn urls(&self) -> &SiteUrls {
        &self.urls
    }

    /// Fetches one listing page
    ///
    /// # Errors
    ///
    /// * `HarvestError::UrlError` - the listing template produced an invalid URL
    /// * `HarvestError::FetchFailed` - every attempt failed
    pub async fn fetch(&self, keyword: &str, page: u32) -> Result<String, HarvestError> {
        let url = self.urls.listing_url(keyword, page)?;
        tracing::debug!("Fetching listing page {}", url);

        self.fetch_with_retry(url.as_str(), RequestKind::Listing)
            .await
            .map_err(|last_error| HarvestError::FetchFailed {
                keyword: keyword.to_string(),
                page,
                last_error: last_error.to_string(),
            })
    }

    /// Fetches one detail page
    pub async fn fetch_detail(&self, url: &str) -> Result<String, HarvestError> {
        tracing::trace!("Fetching detail page {}", url);
        Ok(self.fetch_with_retry(url, RequestKind::Detail).await?)
    }

    async fn fetch_with_retry(&self, url: &str, kind: RequestKind) -> Result<String, TransportError> {
        let mut last_error = TransportError::Request("no attempt made".to_string());

        for attempt in 1..=self.max_attempts {
            self.limiter.wait(kind).await;

            let outcome = tokio::time::timeout(
                self.timeout,
                self.transport.get(url, &self.headers, self.timeout),
            )
            .await
            .unwrap_or(Err(TransportError::Timeout(self.timeout)));

            match outcome {
                Ok(response) if response.is_success() => return Ok(response.body),
                Ok(response) => last_error = TransportError::Status(response.status),
                Err(e) => last_error = e,
            }

            tracing::warn!(
                "Attempt {}/{} for {} failed: {}",
                attempt,
                self.max_attempts,
                url,
                last_error
            );

            if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay * attempt).await;
            }
        }

        Err(last_error)
    }
}

fn default_headers() -> Vec<(String, String)> {
    vec![
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8".to_string(),
        ),
        ("Accept-Language".to_string(), "es-MX,es;q=0.9,en;q=0.5".to_string()),
    ]
}
