use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

use pdf_harvester::cli::Cli;
use pdf_harvester::logging;
use pdf_harvester::{CrawlError, FetchError, HttpClient, PdfCrawler};

#[derive(Error, Debug)]
pub enum MainError {
    #[error("Crawler error: {0}")]
    Crawler(#[from] CrawlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl MainError {
    fn exit_code(&self) -> u8 {
        match self {
            MainError::Crawler(CrawlError::InvalidStartUrl(_))
            | MainError::Crawler(CrawlError::InvalidBatchSize) => 2,
            _ => 3,
        }
    }
}

async fn run(cli: Cli) -> Result<(), MainError> {
    std::fs::create_dir_all(&cli.data_dir)?;
    let _log_guards =
        logging::init_logging_in_data_dir(&cli.data_dir).map_err(|e| MainError::Logging(e.to_string()))?;

    let config = cli.crawl_config();
    let http = Arc::new(HttpClient::new(cli.user_agent.clone())?);

    tracing::info!(
        "Starting crawl of {} (batch size {}, skip duplicates: {})",
        config.start_url,
        config.batch_size,
        config.skip_duplicate
    );

    let mut crawler = PdfCrawler::new(config, http)?;
    let summary = crawler.run().await?;

    println!("{}", summary);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
