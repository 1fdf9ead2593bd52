use serde::Deserialize;

/// Main configuration structure for Listing-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Crawl plan and run-loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Search keywords, crawled in order
    pub keywords: Vec<String>,

    /// Maximum number of listing pages to visit per keyword
    #[serde(rename = "pages-per-keyword")]
    pub pages_per_keyword: u32,

    /// Stop once this many unique items have been collected
    #[serde(rename = "target-items")]
    pub target_items: u64,

    /// Number of keywords crawled in parallel (1 = sequential)
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Visit each new listing's detail page for its description
    #[serde(rename = "fetch-details", default = "default_true")]
    pub fetch_details: bool,

    /// Pages between sink flushes
    #[serde(rename = "flush-every", default = "default_flush_every")]
    pub flush_every: u32,
}

/// Fetch timeout, retry and politeness configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Attempts per page before it is skipped
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Extra pause between failed attempts, multiplied by the attempt number (milliseconds)
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: u64,

    /// Lower bound of the pause before a listing request (milliseconds)
    #[serde(rename = "listing-delay-min", default = "default_listing_delay_min")]
    pub listing_delay_min: u64,

    /// Upper bound of the pause before a listing request (milliseconds)
    #[serde(rename = "listing-delay-max", default = "default_listing_delay_max")]
    pub listing_delay_max: u64,

    /// Lower bound of the pause before a detail request (milliseconds)
    #[serde(rename = "detail-delay-min", default = "default_detail_delay_min")]
    pub detail_delay_min: u64,

    /// Upper bound of the pause before a detail request (milliseconds)
    #[serde(rename = "detail-delay-max", default = "default_detail_delay_max")]
    pub detail_delay_max: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
            listing_delay_min: default_listing_delay_min(),
            listing_delay_max: default_listing_delay_max(),
            detail_delay_min: default_detail_delay_min(),
            detail_delay_max: default_detail_delay_max(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Markup family of the target job board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    /// Cards are `div[id^="jobcard-"]`; detail URLs come from `detail-url`
    #[default]
    Occ,
    /// Cards are `article.box_offer`; detail URLs are the card links
    Computrabajo,
}

/// Target site URL layout
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Which extractor parses this site's pages
    #[serde(default)]
    pub extractor: SiteKind,

    /// Listing page URL template; `{keyword}` is substituted
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Query parameter carrying the page number (omitted on page 1)
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,

    /// Detail page URL template; `{id}` is substituted with the card id
    ///
    /// Only sites whose cards carry an id instead of a link need it.
    #[serde(rename = "detail-url", default)]
    pub detail_url: String,

    /// Tag stored with every item from this site
    #[serde(rename = "source-tag", default = "default_source_tag")]
    pub source_tag: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON checkpoint file
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the CSV export
    #[serde(rename = "csv-path")]
    pub csv_path: String,
}

/// Relevance filter terms; an empty list accepts everything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Terms matched against title and description
    #[serde(rename = "topic-terms", default)]
    pub topic_terms: Vec<String>,

    /// Terms matched against the locality
    #[serde(rename = "location-terms", default)]
    pub location_terms: Vec<String>,
}

fn default_workers() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_flush_every() -> u32 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5000
}

fn default_listing_delay_min() -> u64 {
    2000
}

fn default_listing_delay_max() -> u64 {
    4000
}

fn default_detail_delay_min() -> u64 {
    500
}

fn default_detail_delay_max() -> u64 {
    1000
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_source_tag() -> String {
    "OCC".to_string()
}
