//! One-level crawl of a single site
//!
//! A crawl fetches the site's root page, indexes it, then fetches and
//! indexes every distinct http(s) link found on it, one at a time with a
//! politeness delay in between. Links found on those pages are not followed.
//!
//! The stop token is honored at every suspension point: before each link,
//! during the politeness delay and during a fetch.

use crate::config::SiteConfig;
use crate::crawler::{FetchedPage, PageFetcher};
use crate::indexing::{IndexWriter, SiteLifecycle};
use crate::state::CrawlPhase;
use crate::storage::SiteRecord;
use crate::url::{is_fetchable, normalize_link, page_path};
use crate::{FetchError, IndexingError};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Progress of a crawl when it ended
///
/// `crawl_site` returns a report only for `Done` and `Stopped` crawls; a
/// `Failed` crawl surfaces as its error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub site_id: i64,
    pub phase: CrawlPhase,
    pub pages_indexed: usize,
    /// Links whose fetch failed; they are skipped, not fatal
    pub failed_links: usize,
}

/// Final report of a crawl plus the error that ended it, if any
struct Traversal {
    report: CrawlReport,
    error: Option<IndexingError>,
}

/// Mutable progress of one crawl invocation
struct Crawl {
    site_id: i64,
    phase: CrawlPhase,
    pages_indexed: usize,
    failed_links: usize,
}

impl Crawl {
    fn new(site_id: i64) -> Self {
        Self {
            site_id,
            phase: CrawlPhase::Idle,
            pages_indexed: 0,
            failed_links: 0,
        }
    }

    fn advance(&mut self, next: CrawlPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid crawl phase change {} -> {}",
            self.phase,
            next
        );
        self.phase = next;
    }

    fn finish(mut self, phase: CrawlPhase) -> CrawlReport {
        self.advance(phase);
        CrawlReport {
            site_id: self.site_id,
            phase: self.phase,
            pages_indexed: self.pages_indexed,
            failed_links: self.failed_links,
        }
    }
}

/// Crawls configured sites into the index
pub struct SiteCrawler {
    fetcher: Arc<dyn PageFetcher>,
    writer: Arc<IndexWriter>,
    sites: Arc<SiteLifecycle>,
    fetch_delay: Duration,
}

impl SiteCrawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        writer: Arc<IndexWriter>,
        sites: Arc<SiteLifecycle>,
        fetch_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            writer,
            sites,
            fetch_delay,
        }
    }

    /// Crawls one site and records the outcome on its status
    ///
    /// # Outcomes
    ///
    /// | Result | Site status |
    /// |--------|-------------|
    /// | every link visited | `INDEXED` |
    /// | `stop` observed | `INDEXING`, last error "Indexing stopped by user" |
    /// | error | `FAILED`, last error is the error message |
    ///
    /// A failed link fetch is logged and skipped. Failing to fetch the root
    /// page, or any storage failure, fails the whole site.
    pub async fn crawl_site(
        &self,
        config: &SiteConfig,
        stop: &CancellationToken,
    ) -> Result<CrawlReport, IndexingError> {
        let mut site = match self.sites.create_or_update(config) {
            Ok(site) => site,
            Err(e) => {
                let error = IndexingError::from(e);
                self.record_failure_by_url(&config.url, &error);
                return Err(error);
            }
        };

        tracing::info!("Indexing {} ({})", site.name, site.url);

        let Traversal { report, error } = self.traverse(&site, stop).await;

        if let Some(error) = error {
            tracing::error!("Indexing of {} failed: {}", site.url, error);
            if let Err(e) = self.sites.mark_failed(&mut site, &error.to_string()) {
                tracing::error!("Could not mark {} as failed: {}", site.url, e);
            }
            return Err(error);
        }

        if report.phase == CrawlPhase::Stopped {
            self.sites.mark_interrupted(&mut site)?;
            tracing::info!(
                "Indexing of {} stopped after {} pages",
                site.url,
                report.pages_indexed
            );
        } else {
            self.sites.mark_indexed(&mut site)?;
            tracing::info!(
                "Indexed {}: {} pages, {} failed links",
                site.url,
                report.pages_indexed,
                report.failed_links
            );
        }

        Ok(report)
    }

    /// Runs the crawl and ends it in `Done`, `Stopped` or `Failed`
    async fn traverse(&self, site: &SiteRecord, stop: &CancellationToken) -> Traversal {
        let mut crawl = Crawl::new(site.id);

        match self.visit(site, stop, &mut crawl).await {
            Ok(phase) => Traversal {
                report: crawl.finish(phase),
                error: None,
            },
            Err(error) => {
                tracing::debug!("Crawl of {} failed while {}", site.url, crawl.phase);
                Traversal {
                    report: crawl.finish(CrawlPhase::Failed),
                    error: Some(error),
                }
            }
        }
    }

    /// Visits the root page and its links, returning `Done` or `Stopped`
    async fn visit(
        &self,
        site: &SiteRecord,
        stop: &CancellationToken,
        crawl: &mut Crawl,
    ) -> Result<CrawlPhase, IndexingError> {
        crawl.advance(CrawlPhase::FetchingRoot);
        let root = Url::parse(&site.url).map_err(|source| FetchError::InvalidUrl {
            url: site.url.clone(),
            source,
        })?;

        let Some(root_page) = self.fetch(&site.url, stop).await? else {
            return Ok(CrawlPhase::Stopped);
        };

        self.writer
            .index_page(site, "/", root_page.status_code, &root_page.body)?;
        crawl.pages_indexed += 1;

        let links = collect_links(&root_page.links, &root);
        tracing::debug!("{} links to visit on {}", links.len(), site.url);

        crawl.advance(CrawlPhase::IteratingLinks);
        for (link, path) in links {
            if stop.is_cancelled() {
                return Ok(CrawlPhase::Stopped);
            }

            tokio::select! {
                biased;
                _ = stop.cancelled() => return Ok(CrawlPhase::Stopped),
                _ = tokio::time::sleep(self.fetch_delay) => {}
            }

            match self.fetch(&link, stop).await {
                Ok(Some(page)) => {
                    self.writer
                        .index_page(site, &path, page.status_code, &page.body)?;
                    crawl.pages_indexed += 1;
                }
                Ok(None) => return Ok(CrawlPhase::Stopped),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", link, e);
                    crawl.failed_links += 1;
                }
            }
        }

        Ok(CrawlPhase::Done)
    }

    /// Fetches `url` unless `stop` fires first
    ///
    /// Returns `Ok(None)` when stopped.
    async fn fetch(
        &self,
        url: &str,
        stop: &CancellationToken,
    ) -> Result<Option<FetchedPage>, FetchError> {
        // A stop drops the pending request instead of waiting for it to
        // complete. Nothing has been written for this url yet, so the
        // page keeps whatever an earlier crawl stored.
        tokio::select! {
            biased;
            _ = stop.cancelled() => Ok(None),
            result = self.fetcher.fetch(url) => result.map(Some),
        }
    }

    fn record_failure_by_url(&self, url: &str, error: &IndexingError) {
        if let Err(e) = self.sites.mark_failed_by_url(url, &error.to_string()) {
            tracing::error!("Could not mark {} as failed: {}", url, e);
        }
    }
}

/// Normalizes raw hrefs into the distinct fetchable links of a site
///
/// Returns `(url, path)` pairs in first-seen order. The root page itself is
/// never revisited.
fn collect_links(hrefs: &[String], root: &Url) -> Vec<(String, String)> {
    let mut seen = HashSet::from(["/".to_string()]);
    let mut links = Vec::new();

    for href in hrefs {
        let Some(link) = normalize_link(href, root) else {
            continue;
        };
        if !is_fetchable(&link) {
            tracing::debug!("Skipping non-http link {}", link);
            continue;
        }
        let Ok(url) = Url::parse(&link) else {
            continue;
        };

        let path = page_path(root, &url);
        if seen.insert(path.clone()) {
            links.push((link, path));
        }
    }

    links
}
