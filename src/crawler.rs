use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::backoff::RetryPolicy;
use crate::checkpoint::{CheckpointError, CheckpointManager, CheckpointSnapshot};
use crate::classifier::{self, ClassifyContext};
use crate::config::{Config, CrawlConfig};
use crate::downloader::Downloader;
use crate::frontier::Frontier;
use crate::models::{CrawlSummary, PdfTarget, RunCounters};
use crate::network::{self, Transport};
use crate::parser;
use crate::registry::PdfRegistry;
use crate::url_utils;
use crate::validator;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid start URL: {0}")]
    InvalidStartUrl(String),

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Could not create download directory {}: {source}", .path.display())]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Single owner of the crawl state: frontier, registry, counters and the batch being filled.
///
/// Pages are processed one at a time. Downloads run concurrently only inside a
/// dispatched batch, and the loop waits for the whole batch before it touches
/// state again.
pub struct PdfCrawler<T: ?Sized> {
    config: CrawlConfig,
    transport: Arc<T>,
    downloader: Downloader<T>,
    checkpoints: CheckpointManager,
    page_policy: RetryPolicy,
    base_domain: String,
    site_root: String,
    download_dir: PathBuf,
    frontier: Frontier,
    registry: PdfRegistry,
    counters: RunCounters,
    batch: Vec<PdfTarget>,
}

impl<T> PdfCrawler<T>
where
    T: Transport + ?Sized + 'static,
{
    pub fn new(config: CrawlConfig, transport: Arc<T>) -> Result<Self, CrawlError> {
        let base_domain = url_utils::extract_host(&config.start_url)
            .ok_or_else(|| CrawlError::InvalidStartUrl(config.start_url.clone()))?;
        let site_root = url_utils::site_root(&config.start_url)
            .ok_or_else(|| CrawlError::InvalidStartUrl(config.start_url.clone()))?;

        if config.batch_size == 0 {
            return Err(CrawlError::InvalidBatchSize);
        }

        let downloader = Downloader::new(
            Arc::clone(&transport),
            RetryPolicy::new(config.download_max_attempts, config.download_retry_backoff),
            config.download_timeout,
        );
        let checkpoints = CheckpointManager::new(config.resume_path(), config.metadata_path());
        let page_policy = RetryPolicy::new(config.page_max_attempts, config.page_retry_backoff);
        let download_dir = config.download_dir();

        Ok(Self {
            config,
            transport,
            downloader,
            checkpoints,
            page_policy,
            base_domain,
            site_root,
            download_dir,
            frontier: Frontier::new(),
            registry: PdfRegistry::new(),
            counters: RunCounters::default(),
            batch: Vec::new(),
        })
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn registry(&self) -> &PdfRegistry {
        &self.registry
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Crawl until the frontier is exhausted, then write the catalog and drop the resume file.
    pub async fn run(&mut self) -> Result<CrawlSummary, CrawlError> {
        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|source| CrawlError::DownloadDir {
                path: self.download_dir.clone(),
                source,
            })?;

        self.restore_or_seed().await?;

        while let Some(url) = self.frontier.dequeue() {
            if !self.frontier.mark_visited(&url) {
                continue;
            }

            self.visit(&url).await;

            if self.frontier.visited_len() % Config::CHECKPOINT_EVERY_PAGES == 0 {
                self.checkpoint().await;
            }
        }

        self.flush_batch().await;
        self.checkpoints.finalize_success(self.registry.targets()).await?;

        let summary = self.summary();
        info!(
            "[All Done] PDF downloaded: {} | Success: {} | Fail: {}",
            summary.pdfs_downloaded, summary.total_success, summary.total_fail
        );
        Ok(summary)
    }

    pub fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            pages_visited: self.frontier.visited_len(),
            pdfs_discovered: self.registry.len(),
            pdfs_downloaded: self.registry.completed_len(),
            total_success: self.counters.total_success,
            total_fail: self.counters.total_fail,
        }
    }

    async fn restore_or_seed(&mut self) -> Result<(), CrawlError> {
        let Some(snapshot) = self.checkpoints.load_if_present().await? else {
            self.frontier = Frontier::with_seed(self.config.start_url.clone());
            return Ok(());
        };

        let (frontier, registry, counters) = snapshot.into_parts();
        self.frontier = frontier;
        self.registry = registry;
        self.counters = counters;
        warn!(
            "[Resume] Resume previous session, queue: {}",
            self.frontier.pending_len()
        );

        // Downloads that were scheduled but never finished before the interruption
        let unfinished = self.registry.pending_downloads();
        if !unfinished.is_empty() {
            info!("Rescheduling {} unfinished download(s)", unfinished.len());
            for target in unfinished {
                self.schedule(target).await;
            }
        }

        Ok(())
    }

    async fn visit(&mut self, url: &str) {
        let html = match network::fetch_html(
            self.transport.as_ref(),
            url,
            self.page_policy,
            self.config.page_timeout,
        )
        .await
        {
            Some(html) => html,
            None => {
                error!("[Fetch Fail] {}", url);
                return;
            }
        };

        let page = parser::parse_page(&html);
        let classified = classifier::classify(
            &page.links,
            &ClassifyContext {
                page_url: url,
                page_title: &page.title,
                base_domain: &self.base_domain,
                site_root: &self.site_root,
                download_dir: &self.download_dir,
            },
        );

        for link in classified.page_links {
            self.frontier.enqueue(link);
        }

        // Register the whole page first so a mid-page checkpoint already knows every target
        let fresh: Vec<PdfTarget> = classified
            .pdf_targets
            .into_iter()
            .filter(|target| self.registry.register(target.clone()))
            .collect();
        for target in fresh {
            self.schedule(target).await;
        }

        self.flush_batch().await;

        info!(
            "[Crawled] {} | [Queue] {} | [PDF Found] {} | [Downloaded] {}",
            self.frontier.visited_len(),
            self.frontier.pending_len(),
            self.registry.len(),
            self.registry.completed_len()
        );
    }

    /// Add a target to the current batch, dispatching and checkpointing once the batch is full.
    async fn schedule(&mut self, target: PdfTarget) {
        if self.registry.is_complete(&target.file_name) {
            debug!("{} already downloaded", target.file_name);
            return;
        }

        if self.config.skip_duplicate && validator::is_valid_pdf_async(&target.local_path).await {
            warn!("[Skip Exists] {}", target.file_name);
            self.registry.mark_complete(target.file_name);
            return;
        }

        // Targets in one batch must write distinct local paths
        if self.batch.iter().any(|queued| queued.file_name == target.file_name) {
            debug!("{} already in flight, dispatching current batch first", target.file_name);
            self.flush_batch().await;
        }

        self.batch.push(target);
        if self.batch.len() >= self.config.batch_size {
            self.flush_batch().await;
            self.checkpoint().await;
        }
    }

    async fn flush_batch(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let targets = std::mem::take(&mut self.batch);
        let report = self.downloader.download_batch(targets).await;

        for outcome in &report.outcomes {
            if outcome.is_success() {
                self.registry.mark_complete(outcome.target.file_name.clone());
            } else {
                self.registry.mark_failed(outcome.target.url.clone());
            }
        }
        self.counters.record(report.success_count, report.fail_count);

        info!(
            "[Batch Download] Downloaded: {} | Success: {} | Fail: {}",
            self.registry.completed_len(),
            self.counters.total_success,
            self.counters.total_fail
        );
    }

    /// A failed save skips this cycle; the next one rewrites the whole file anyway.
    async fn checkpoint(&self) {
        let snapshot = CheckpointSnapshot::capture(&self.frontier, &self.registry, &self.counters);
        if let Err(e) = self.checkpoints.save(&snapshot).await {
            error!("Checkpoint save failed, continuing: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{ByteStream, FetchError};
    use crate::validator::tests::sample_pdf;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MiniSite {
        pages: HashMap<String, String>,
        files: HashMap<String, Vec<u8>>,
        file_hits: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for MiniSite {
        async fn get_text(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
            self.pages.get(url).cloned().ok_or(FetchError::Status(404))
        }

        async fn open_stream(&self, url: &str, _timeout: Duration) -> Result<ByteStream, FetchError> {
            self.file_hits.lock().push(url.to_string());
            let bytes = self.files.get(url).cloned().ok_or(FetchError::Status(404))?;
            Ok(Box::pin(futures_util::stream::iter(vec![Ok(bytes)])))
        }
    }

    fn config(dir: &TempDir) -> CrawlConfig {
        let mut config = CrawlConfig::new("https://test.local/", dir.path());
        config.page_retry_backoff = Duration::ZERO;
        config
    }

    #[test]
    fn test_rejects_bad_start_url() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.start_url = "not a url".to_string();
        let result = PdfCrawler::new(config, Arc::new(MiniSite::default()));
        assert!(matches!(result, Err(CrawlError::InvalidStartUrl(_))));
    }

    #[test]
    fn test_rejects_zero_batch() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.batch_size = 0;
        let result = PdfCrawler::new(config, Arc::new(MiniSite::default()));
        assert!(matches!(result, Err(CrawlError::InvalidBatchSize)));
    }

    #[tokio::test]
    async fn test_existing_valid_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        std::fs::create_dir_all(config.download_dir()).unwrap();
        std::fs::write(config.download_dir().join("kept.pdf"), sample_pdf(2)).unwrap();

        let mut site = MiniSite::default();
        site.pages.insert(
            "https://test.local/".to_string(),
            r#"<a href="/kept.pdf">kept</a><a href="/new.pdf">new</a>"#.to_string(),
        );
        site.files.insert("https://test.local/new.pdf".to_string(), sample_pdf(1));
        let site = Arc::new(site);

        let mut crawler = PdfCrawler::new(config, Arc::clone(&site)).unwrap();
        let summary = crawler.run().await.unwrap();

        assert_eq!(*site.file_hits.lock(), vec!["https://test.local/new.pdf".to_string()]);
        assert_eq!(summary.pdfs_discovered, 2);
        assert_eq!(summary.pdfs_downloaded, 2);
        // Skipped files are complete but not counted as download successes
        assert_eq!(summary.total_success, 1);
        assert_eq!(summary.total_fail, 0);
    }

    #[tokio::test]
    async fn test_skip_disabled_downloads_again() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.skip_duplicate = false;
        std::fs::create_dir_all(config.download_dir()).unwrap();
        std::fs::write(config.download_dir().join("kept.pdf"), sample_pdf(2)).unwrap();

        let mut site = MiniSite::default();
        site.pages.insert(
            "https://test.local/".to_string(),
            r#"<a href="/kept.pdf">kept</a>"#.to_string(),
        );
        site.files.insert("https://test.local/kept.pdf".to_string(), sample_pdf(3));
        let site = Arc::new(site);

        let mut crawler = PdfCrawler::new(config, Arc::clone(&site)).unwrap();
        let summary = crawler.run().await.unwrap();

        assert_eq!(site.file_hits.lock().len(), 1);
        assert_eq!(summary.total_success, 1);
    }

    #[tokio::test]
    async fn test_unreachable_seed_still_finalizes() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let metadata = config.metadata_path();

        let mut crawler = PdfCrawler::new(config, Arc::new(MiniSite::default())).unwrap();
        let summary = crawler.run().await.unwrap();

        assert_eq!(summary.pages_visited, 1);
        assert_eq!(summary.pdfs_discovered, 0);
        assert_eq!(std::fs::read_to_string(metadata).unwrap(), "[]");
    }
}
