use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Lemma-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

/// Indexing run behavior
#[derive(Debug, Clone, Deserialize)]
pub struct IndexingConfig {
    /// Number of sites crawled concurrently (worker pool size)
    #[serde(rename = "max-concurrent-sites", default = "default_max_concurrent_sites")]
    pub max_concurrent_sites: u32,

    /// Delay before each outbound link fetch (milliseconds)
    #[serde(rename = "fetch-delay-ms", default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,

    /// How long `stop_indexing` waits for workers before forcing again (milliseconds)
    #[serde(rename = "stop-timeout-ms", default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,

    /// Per-request HTTP timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl IndexingConfig {
    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sites: default_max_concurrent_sites(),
            fetch_delay_ms: default_fetch_delay_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_max_concurrent_sites() -> u32 {
    4
}

fn default_fetch_delay_ms() -> u64 {
    500
}

fn default_stop_timeout_ms() -> u64 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Headers sent with every outbound fetch
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Value of the User-Agent header
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Value of the Referer header
    pub referer: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// One site to index
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteConfig {
    /// Root URL of the site; also its natural key
    pub url: String,

    /// Display name
    pub name: String,
}

impl SiteConfig {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
        }
    }
}
