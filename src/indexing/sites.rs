//! Site lifecycle management
//!
//! Every status change goes through here, so the status and its timestamp
//! are always written together.

use crate::config::SiteConfig;
use crate::state::SiteStatus;
use crate::storage::{NewSite, SiteRecord, Storage, StorageResult};
use chrono::Utc;
use std::sync::Arc;

/// Last error recorded for a site whose crawl was stopped by the user
pub const INTERRUPTED_MESSAGE: &str = "Indexing stopped by user";

/// Creates sites and moves them through their statuses
pub struct SiteLifecycle {
    storage: Arc<dyn Storage>,
}

impl SiteLifecycle {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Starts a crawl of a configured site
    ///
    /// Creates the site if its URL is unknown. An existing site keeps its ID
    /// and pages; its name is refreshed from `config` and any previous error
    /// is cleared. Either way the site ends up `INDEXING`.
    pub fn create_or_update(&self, config: &SiteConfig) -> StorageResult<SiteRecord> {
        match self.storage.find_site_by_url(&config.url)? {
            Some(mut site) => {
                site.name = config.name.clone();
                site.status = SiteStatus::Indexing;
                site.status_time = Utc::now();
                site.last_error = None;
                self.storage.update_site(&site)?;

                tracing::info!("Re-indexing site {} (id {})", site.url, site.id);
                Ok(site)
            }
            None => {
                let site = self.storage.insert_site(&NewSite {
                    status: SiteStatus::Indexing,
                    status_time: Utc::now(),
                    url: config.url.clone(),
                    name: config.name.clone(),
                })?;

                tracing::info!("Created site {} (id {})", site.url, site.id);
                Ok(site)
            }
        }
    }

    pub fn find_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        self.storage.find_site_by_url(url)
    }

    /// Marks a finished crawl
    pub fn mark_indexed(&self, site: &mut SiteRecord) -> StorageResult<()> {
        self.transition(site, SiteStatus::Indexed, None)
    }

    /// Marks a failed crawl and records why
    pub fn mark_failed(&self, site: &mut SiteRecord, error: &str) -> StorageResult<()> {
        self.transition(site, SiteStatus::Failed, Some(error.to_string()))
    }

    /// Records that a crawl was stopped before visiting every link
    ///
    /// The site stays `INDEXING` (neither finished nor failed) with
    /// [`INTERRUPTED_MESSAGE`] as its last error.
    pub fn mark_interrupted(&self, site: &mut SiteRecord) -> StorageResult<()> {
        self.transition(
            site,
            SiteStatus::Indexing,
            Some(INTERRUPTED_MESSAGE.to_string()),
        )
    }

    /// Marks the site with the given URL as failed, if it exists
    ///
    /// Returns false when no such site is stored.
    pub fn mark_failed_by_url(&self, url: &str, error: &str) -> StorageResult<bool> {
        match self.storage.find_site_by_url(url)? {
            Some(mut site) => {
                self.mark_failed(&mut site, error)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn transition(
        &self,
        site: &mut SiteRecord,
        status: SiteStatus,
        last_error: Option<String>,
    ) -> StorageResult<()> {
        if !site.status.can_transition_to(status) {
            tracing::warn!(
                "Unexpected status change {} -> {} for site {}",
                site.status,
                status,
                site.url
            );
        }

        site.status = status;
        site.status_time = Utc::now();
        site.last_error = last_error;
        self.storage.update_site(site)?;

        tracing::debug!("Site {} is now {}", site.url, status);
        Ok(())
    }
}
