//! Indexing orchestration
//!
//! The service owns the single-flight state of indexing runs. A run gets a
//! fresh stop token and its own worker pool; one task per configured site
//! is submitted to the pool. The run counts as active until the last of its
//! site tasks has finished, so `start_indexing` cannot overlap a run that
//! is still crawling.

use crate::config::{Config, IndexingConfig, SiteConfig};
use crate::crawler::{HttpFetcher, PageFetcher, SiteCrawler};
use crate::indexing::{IndexWriter, LemmaExtractor, SiteLifecycle, WordLemmaExtractor};
use crate::output::IndexingResponse;
use crate::runner::TaskRunner;
use crate::storage::{PageRecord, SqliteStorage, Storage};
use crate::url::{belongs_to_site, page_path};
use crate::{FetchError, IndexingError, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Handle to the run currently in progress
#[derive(Clone)]
struct ActiveRun {
    stop: CancellationToken,
    runner: Arc<TaskRunner>,
}

struct ServiceInner {
    sites: Vec<SiteConfig>,
    settings: IndexingConfig,
    fetcher: Arc<dyn PageFetcher>,
    lifecycle: Arc<SiteLifecycle>,
    writer: Arc<IndexWriter>,
    crawler: Arc<SiteCrawler>,
    running: AtomicBool,
    idle: Notify,
    active: Mutex<Option<ActiveRun>>,
}

impl ServiceInner {
    fn active_run(&self) -> Option<ActiveRun> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_active_run(&self, run: Option<ActiveRun>) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = run;
    }

    /// Releases the single-flight flag and wakes `wait_for_idle` callers
    fn finish_run(&self) {
        self.set_active_run(None);
        self.running.store(false, Ordering::Release);
        self.idle.notify_waiters();
        tracing::info!("Indexing run finished");
    }
}

/// Entry point for starting, stopping and targeted re-indexing
///
/// Cloning is cheap; clones share the same run state.
#[derive(Clone)]
pub struct IndexingService {
    inner: Arc<ServiceInner>,
}

impl IndexingService {
    /// Wires the service from its collaborators
    pub fn new(
        sites: Vec<SiteConfig>,
        settings: IndexingConfig,
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn LemmaExtractor>,
    ) -> Self {
        let lifecycle = Arc::new(SiteLifecycle::new(Arc::clone(&storage)));
        let writer = Arc::new(IndexWriter::new(storage, extractor));
        let crawler = Arc::new(SiteCrawler::new(
            Arc::clone(&fetcher),
            Arc::clone(&writer),
            Arc::clone(&lifecycle),
            settings.fetch_delay(),
        ));

        Self {
            inner: Arc::new(ServiceInner {
                sites,
                settings,
                fetcher,
                lifecycle,
                writer,
                crawler,
                running: AtomicBool::new(false),
                idle: Notify::new(),
                active: Mutex::new(None),
            }),
        }
    }

    /// Builds the production service: SQLite storage, HTTP fetcher and the
    /// word extractor
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = SqliteStorage::new(Path::new(&config.storage.database_path))?;
        let fetcher = HttpFetcher::new(&config.user_agent, config.indexing.request_timeout())?;

        Ok(Self::new(
            config.sites.clone(),
            config.indexing.clone(),
            Arc::new(storage),
            Arc::new(fetcher),
            Arc::new(WordLemmaExtractor::default()),
        ))
    }

    /// Starts indexing every configured site
    ///
    /// Returns as soon as the site tasks are submitted; the crawls continue
    /// in the background. Fails with [`IndexingError::AlreadyRunning`] while a
    /// previous run still has site tasks in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_indexing(&self) -> Result<()> {
        let inner = &self.inner;
        if inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Indexing start rejected: a run is already in progress");
            return Err(IndexingError::AlreadyRunning);
        }

        let workers = inner.settings.max_concurrent_sites as usize;
        tracing::info!(
            "Starting indexing of {} sites with {} workers",
            inner.sites.len(),
            workers
        );

        let stop = CancellationToken::new();
        let runner = Arc::new(TaskRunner::new("site-indexer", workers, stop.child_token()));
        inner.set_active_run(Some(ActiveRun {
            stop,
            runner: Arc::clone(&runner),
        }));

        for site in &inner.sites {
            let crawler = Arc::clone(&inner.crawler);
            let site = site.clone();
            let submitted = runner.submit(site.url.clone(), move |token| async move {
                crawler.crawl_site(&site, &token).await.map(|_| ())
            });

            if let Err(e) = submitted {
                runner.shutdown_now();
                inner.finish_run();
                return Err(e.into());
            }
        }
        runner.shutdown();

        let supervisor = Arc::clone(inner);
        tokio::spawn(async move {
            runner.join().await;
            let stats = runner.stats();
            tracing::debug!(
                "Site tasks: {} completed, {} failed, {} panicked, {} never started",
                stats.completed,
                stats.failed,
                stats.panicked,
                stats.never_started
            );
            supervisor.finish_run();
        });

        Ok(())
    }

    /// Stops the current run
    ///
    /// Signals every crawl to stop, drops queued site tasks and waits up to
    /// the configured stop timeout for the workers. If they are still busy,
    /// the stop is issued once more and the method returns anyway. Crawls
    /// that observe the stop leave their site `INDEXING` with an
    /// "interrupted" last error.
    ///
    /// Never fails; stopping an idle service does nothing.
    pub async fn stop_indexing(&self) {
        let Some(run) = self.inner.active_run() else {
            tracing::info!("Stop requested but no indexing run is active");
            return;
        };

        tracing::info!("Stopping indexing");
        let timeout = self.inner.settings.stop_timeout();

        run.stop.cancel();
        let never_started = run.runner.shutdown_now();
        for site in &never_started {
            tracing::info!("Site {} was never started", site);
        }

        if !run.runner.await_termination(timeout).await {
            tracing::warn!(
                "Site tasks still running after {:?}; re-issuing stop",
                timeout
            );
            run.stop.cancel();
            run.runner.shutdown_now();
        }
    }

    /// Fetches one page and re-indexes it under its owning site
    ///
    /// The site is the configured site whose root URL contains `url`; it
    /// must already exist in storage (i.e. have been indexed at least once).
    /// Safe to call while a full run is crawling the same site.
    pub async fn index_page(&self, url: &str) -> Result<PageRecord> {
        let page_url = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let (site_config, root) = self
            .owning_site(&page_url)
            .ok_or_else(|| IndexingError::SiteNotFound(url.to_string()))?;
        let site = self
            .inner
            .lifecycle
            .find_by_url(&site_config.url)?
            .ok_or_else(|| IndexingError::SiteNotFound(url.to_string()))?;

        let fetched = self.inner.fetcher.fetch(url).await?;
        let path = page_path(&root, &page_url);

        tracing::info!("Re-indexing page {} of {}", path, site.url);
        self.inner
            .writer
            .index_page(&site, &path, fetched.status_code, &fetched.body)
    }

    /// Returns true while a run has site tasks in flight
    pub fn is_indexing(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Waits until no run is active
    pub async fn wait_for_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if !self.is_indexing() {
                return;
            }
            notified.await;
        }
    }

    pub fn start_indexing_response(&self) -> IndexingResponse {
        IndexingResponse::from_result(&self.start_indexing())
    }

    pub async fn stop_indexing_response(&self) -> IndexingResponse {
        self.stop_indexing().await;
        IndexingResponse::ok()
    }

    pub async fn index_page_response(&self, url: &str) -> IndexingResponse {
        IndexingResponse::from_result(&self.index_page(url).await)
    }

    /// Finds the configured site with the longest root that contains `page`
    fn owning_site(&self, page: &Url) -> Option<(&SiteConfig, Url)> {
        self.inner
            .sites
            .iter()
            .filter_map(|site| Url::parse(&site.url).ok().map(|root| (site, root)))
            .filter(|(_, root)| belongs_to_site(page, root))
            .max_by_key(|(_, root)| root.path().len())
    }
}
