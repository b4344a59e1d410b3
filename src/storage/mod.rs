//! Storage module for persisting sites, pages and the inverted index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site status persistence
//! - Page upserts keyed by (site, path)
//! - Atomic lemma frequency accumulation
//! - Page-lemma rank upserts (the `search_index` table)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use chrono::{DateTime, Utc};

/// Represents a site in the database
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    pub id: i64,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub last_error: Option<String>,
    pub url: String,
    pub name: String,
}

/// A site that has not been inserted yet
#[derive(Debug, Clone)]
pub struct NewSite {
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub url: String,
    pub name: String,
}

/// Represents a fetched page in the database
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// Represents a lemma of one site
#[derive(Debug, Clone, PartialEq)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    /// Sum of per-page occurrence counts across every indexing pass
    pub frequency: i64,
}

/// Represents the weight of one lemma on one page
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    pub rank: f64,
}

/// Row counts for one site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteStatistics {
    pub pages: u64,
    pub lemmas: u64,
    pub index_entries: u64,
}
