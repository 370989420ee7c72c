// Global configuration constants - single source of truth

use std::path::PathBuf;
use std::time::Duration;

pub struct Config;

impl Config {
    // Page fetching
    pub const PAGE_TIMEOUT_SECS: u64 = 15;
    pub const PAGE_MAX_ATTEMPTS: u32 = 3;
    pub const PAGE_RETRY_BACKOFF_MS: u64 = 2_000;

    // PDF downloads
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 30;
    pub const DOWNLOAD_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BATCH_SIZE: usize = 5;
    pub const MIN_PDF_BYTES: u64 = 1_000;

    // Persistence
    pub const CHECKPOINT_EVERY_PAGES: usize = 10;
    pub const RESUME_FILE: &'static str = "resume_crawl.json";
    pub const METADATA_FILE: &'static str = "all_pdf_metadata.json";
    pub const DOWNLOAD_DIR: &'static str = "pdf_downloads";

    // HTTP client
    pub const USER_AGENT: &'static str = "PdfHarvester/1.0";
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const POOL_IDLE_PER_HOST: usize = 16;
    pub const MAX_REDIRECTS: usize = 5;
}

/// Runtime settings for one crawl run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_url: String,
    /// Directory holding the resume file, the metadata catalog and the download directory.
    pub data_dir: PathBuf,
    /// Skip targets whose file already exists on disk and validates.
    pub skip_duplicate: bool,
    pub batch_size: usize,
    pub page_timeout: Duration,
    pub page_max_attempts: u32,
    pub page_retry_backoff: Duration,
    pub download_timeout: Duration,
    pub download_max_attempts: u32,
    pub download_retry_backoff: Duration,
}

impl CrawlConfig {
    pub fn new(start_url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_url: start_url.into(),
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.data_dir.join(Config::DOWNLOAD_DIR)
    }

    pub fn resume_path(&self) -> PathBuf {
        self.data_dir.join(Config::RESUME_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(Config::METADATA_FILE)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            data_dir: PathBuf::from("."),
            skip_duplicate: true,
            batch_size: Config::DEFAULT_BATCH_SIZE,
            page_timeout: Duration::from_secs(Config::PAGE_TIMEOUT_SECS),
            page_max_attempts: Config::PAGE_MAX_ATTEMPTS,
            page_retry_backoff: Duration::from_millis(Config::PAGE_RETRY_BACKOFF_MS),
            download_timeout: Duration::from_secs(Config::DOWNLOAD_TIMEOUT_SECS),
            download_max_attempts: Config::DOWNLOAD_MAX_ATTEMPTS,
            download_retry_backoff: Duration::ZERO,
        }
    }
}
