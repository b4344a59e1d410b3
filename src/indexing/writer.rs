//! Index writer
//!
//! Persists one fetched page and folds its lemma counts into the site's
//! inverted index.

use crate::indexing::LemmaExtractor;
use crate::storage::{PageRecord, SiteRecord, Storage, StorageError};
use crate::IndexingError;
use std::sync::Arc;

/// Writes pages, lemma frequencies and index ranks
///
/// Safe to share between concurrently running site tasks; every write is a
/// single atomic upsert in the storage layer.
pub struct IndexWriter {
    storage: Arc<dyn Storage>,
    extractor: Arc<dyn LemmaExtractor>,
}

impl IndexWriter {
    pub fn new(storage: Arc<dyn Storage>, extractor: Arc<dyn LemmaExtractor>) -> Self {
        Self { storage, extractor }
    }

    /// Stores a page and updates the index with its lemmas
    ///
    /// # Behavior
    ///
    /// 1. The (site, path) page row is created or overwritten with `code`
    ///    and `content`
    /// 2. Each lemma's site-wide frequency grows by its count on this page
    /// 3. The page's index entries are replaced: one (page, lemma) entry per
    ///    lemma on this page, ranked by its count
    ///
    /// Re-indexing a page therefore never duplicates rows and drops entries
    /// for words the page no longer contains, but it does add the page's
    /// counts to the lemma frequencies again.
    ///
    /// # Errors
    ///
    /// Storage and extraction failures are returned with the page path.
    pub fn index_page(
        &self,
        site: &SiteRecord,
        path: &str,
        code: u16,
        content: &str,
    ) -> Result<PageRecord, IndexingError> {
        let page = self
            .storage
            .upsert_page(site.id, path, code, content)
            .map_err(|source| page_error(path, source))?;

        self.storage
            .delete_index_entries_for_page(page.id)
            .map_err(|source| page_error(path, source))?;

        let lemmas = self
            .extractor
            .extract(content)
            .map_err(|e| IndexingError::Extraction {
                path: path.to_string(),
                message: format!("{:#}", e),
            })?;

        for (lemma, count) in &lemmas {
            let record = self
                .storage
                .increment_lemma_frequency(site.id, lemma, i64::from(*count))
                .map_err(|source| page_error(path, source))?;

            self.storage
                .upsert_index_entry(page.id, record.id, f64::from(*count))
                .map_err(|source| page_error(path, source))?;
        }

        tracing::debug!(
            "Indexed {}{} ({} lemmas)",
            site.url.trim_end_matches('/'),
            path,
            lemmas.len()
        );

        Ok(page)
    }
}

fn page_error(path: &str, source: StorageError) -> IndexingError {
    IndexingError::Page {
        path: path.to_string(),
        source,
    }
}
