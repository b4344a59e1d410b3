//! Storage traits and error types
//!
//! This module defines the repository interface the indexing core talks to
//! and its error type.

use crate::storage::{IndexRecord, LemmaRecord, NewSite, PageRecord, SiteRecord, SiteStatistics};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Repository interface for sites, pages, lemmas and index entries
///
/// Implementations are shared between concurrently running site tasks, so
/// every method takes `&self` and must serialize writes to a given row.
/// Frequency increments in particular must be a single atomic
/// read-modify-write.
pub trait Storage: Send + Sync {
    // ===== Site Management =====

    /// Finds a site by its root URL (the natural key)
    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Gets a site by ID
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Lists all known sites ordered by ID
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Inserts a new site and returns the stored record
    fn insert_site(&self, site: &NewSite) -> StorageResult<SiteRecord>;

    /// Overwrites every column of an existing site in one statement
    ///
    /// Status and status time are always written together.
    fn update_site(&self, site: &SiteRecord) -> StorageResult<()>;

    // ===== Page Management =====

    /// Inserts a page or overwrites code and content of the existing
    /// (site, path) row
    fn upsert_page(
        &self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<PageRecord>;

    /// Lists the pages of a site ordered by ID
    fn list_pages(&self, site_id: i64) -> StorageResult<Vec<PageRecord>>;

    // ===== Lemma Management =====

    /// Adds `delta` to the frequency of the site's lemma, creating it with
    /// frequency 0 first if needed, and returns the updated row
    fn increment_lemma_frequency(
        &self,
        site_id: i64,
        lemma: &str,
        delta: i64,
    ) -> StorageResult<LemmaRecord>;

    /// Finds a lemma by (site, text)
    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>>;

    // ===== Search Index =====

    /// Inserts the (page, lemma) entry or replaces its rank
    fn upsert_index_entry(
        &self,
        page_id: i64,
        lemma_id: i64,
        rank: f64,
    ) -> StorageResult<IndexRecord>;

    /// Deletes all index entries of a page, returning how many were removed
    fn delete_index_entries_for_page(&self, page_id: i64) -> StorageResult<usize>;

    /// Gets all index entries of a page
    fn index_entries_for_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>>;

    // ===== Statistics =====

    /// Counts pages, lemmas and index entries of a site
    fn site_statistics(&self, site_id: i64) -> StorageResult<SiteStatistics>;
}
