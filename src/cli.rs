use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, CrawlConfig};

/// CLI entry point for a harvesting run.
/// Exit codes: 0=success, 2=invalid arguments, 3=I/O or checkpoint error
#[derive(Parser, Debug)]
#[command(name = "pdf_harvester")]
#[command(about = "Crawl a website and download every PDF it links to, resuming after interruption")]
#[command(version)]
pub struct Cli {
    #[arg(
        short,
        long,
        default_value = "https://peraturan.go.id",
        help = "The starting URL to begin crawling from"
    )]
    pub start_url: String,

    #[arg(
        short,
        long,
        default_value = ".",
        help = "Directory for the resume file, the PDF catalog, logs and downloads"
    )]
    pub data_dir: PathBuf,

    #[arg(
        short,
        long,
        default_value_t = Config::DEFAULT_BATCH_SIZE,
        help = "PDFs downloaded concurrently per batch"
    )]
    pub batch_size: usize,

    #[arg(long, help = "Download again even when a valid file with the same name exists")]
    pub no_skip_duplicate: bool,

    #[arg(
        short,
        long,
        default_value = Config::USER_AGENT,
        help = "User agent string for requests"
    )]
    pub user_agent: String,

    #[arg(
        long,
        default_value_t = Config::PAGE_TIMEOUT_SECS,
        help = "Page fetch timeout in seconds"
    )]
    pub page_timeout: u64,

    #[arg(
        long,
        default_value_t = Config::DOWNLOAD_TIMEOUT_SECS,
        help = "PDF download timeout in seconds"
    )]
    pub download_timeout: u64,
}

impl Cli {
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            skip_duplicate: !self.no_skip_duplicate,
            batch_size: self.batch_size,
            page_timeout: Duration::from_secs(self.page_timeout),
            download_timeout: Duration::from_secs(self.download_timeout),
            ..CrawlConfig::new(self.start_url.trim(), self.data_dir.clone())
        }
    }
}
