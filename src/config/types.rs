use crate::extract::FieldMap;
use serde::Deserialize;

/// Main configuration structure for Review-Trawl
///
/// Every section has defaults so a crawl can be driven entirely from the
/// command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub fields: FieldMap,
}

/// Crawl target and fetch policy
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed URLs, each starting its own pagination chain
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Maximum number of pages fetched in one crawl
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum number of records written (0 = unbounded)
    #[serde(rename = "max-records", default)]
    pub max_records: u64,

    /// Attempts per page before the crawl fails
    #[serde(rename = "fetch-attempts", default = "default_fetch_attempts")]
    pub fetch_attempts: u32,

    /// Fixed delay between fetch attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// HTTP request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            max_pages: default_max_pages(),
            max_records: 0,
            fetch_attempts: default_fetch_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
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

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "review-trawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON-lines record file
    #[serde(rename = "records-path", default = "default_records_path")]
    pub records_path: String,

    /// Path to the SQLite checkpoint database
    #[serde(rename = "checkpoint-path", default = "default_checkpoint_path")]
    pub checkpoint_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: default_records_path(),
            checkpoint_path: default_checkpoint_path(),
        }
    }
}

fn default_max_pages() -> u32 {
    50
}

fn default_fetch_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_records_path() -> String {
    "reviews.jl".to_string()
}

fn default_checkpoint_path() -> String {
    "review-trawl.db".to_string()
}
