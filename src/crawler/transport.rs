//! HTTP transport
//!
//! The fetcher owns retry and politeness policy; the transport only issues
//! one GET and returns the status and body. Tests swap in scripted
//! transports through the `Transport` trait.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a single transport call
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// Status and body of one response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests on behalf of the page fetcher
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Default per-request timeout
///
/// # Example
///
/// ```no_run
/// use listing_harvest::config::UserAgentConfig;
/// use listing_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ListingHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(60)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from the user agent configuration
    pub fn from_config(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, timeout)?))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| classify(e, timeout))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(e, timeout))?;

        Ok(TransportResponse { status, body })
    }
}

/// Maps a reqwest error onto the transport error taxonomy
fn classify(error: reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout)
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config, Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[test]
    fn test_response_success_range() {
        let ok = TransportResponse {
            status: 200,
            body: String::new(),
        };
        let not_found = TransportResponse {
            status: 404,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        let transport =
            ReqwestTransport::from_config(&create_test_config(), Duration::from_secs(2)).unwrap();

        // Port 9 (discard) is closed on test machines
        let result = transport
            .get("http://127.0.0.1:9/", &[], Duration::from_secs(2))
            .await;

        assert!(result.is_err());
    }
}
