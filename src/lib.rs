pub mod backoff;
pub mod checkpoint;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod downloader;
pub mod frontier;
pub mod logging;
pub mod models;
pub mod network;
pub mod parser;
pub mod registry;
pub mod url_utils;
pub mod validator;

// Re-export main types for library usage
pub use checkpoint::{CheckpointManager, CheckpointSnapshot};
pub use config::{Config, CrawlConfig};
pub use crawler::{CrawlError, PdfCrawler};
pub use downloader::{BatchReport, DownloadOutcome, DownloadState, Downloader};
pub use models::{CrawlSummary, PdfTarget, RunCounters};
pub use network::{ByteStream, FetchError, HttpClient, Transport};
pub use validator::is_valid_pdf;
