//! Lemma-Crawl: a site crawler that maintains an inverted lemma index
//!
//! This crate crawls a configured set of websites one level deep, stores
//! every fetched page, and keeps an inverted index (lemma → page → rank)
//! up to date for later search queries. Indexing runs are single-flight
//! and can be stopped cooperatively.

pub mod config;
pub mod crawler;
pub mod indexing;
pub mod output;
pub mod runner;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for indexing operations
#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("Indexing is already running")]
    AlreadyRunning,

    #[error("Page {0} does not belong to any indexed site")]
    SiteNotFound(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Lemma extraction failed for page {path}: {message}")]
    Extraction { path: String, message: String },

    #[error("Failed to index page {path}: {source}")]
    Page {
        path: String,
        #[source]
        source: storage::StorageError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Task runner error: {0}")]
    Runner(#[from] runner::RunnerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
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

/// Errors raised while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: ::url::ParseError,
    },
}

/// Result type alias for indexing operations
pub type Result<T> = std::result::Result<T, IndexingError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use indexing::{IndexingService, IndexWriter, LemmaExtractor, SiteLifecycle};
pub use state::{CrawlPhase, SiteStatus};
pub use url::normalize_link;
