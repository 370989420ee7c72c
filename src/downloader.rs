//! Download-then-validate cycle for PDF targets, one at a time or in concurrent batches.

use futures_util::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::backoff::RetryPolicy;
use crate::models::PdfTarget;
use crate::network::{FetchError, Transport};
use crate::validator;

/// Per-target progress. `Succeeded` and `Failed` are terminal; the number is the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Pending,
    Attempting(u32),
    Validating(u32),
    Succeeded(u32),
    Failed(u32),
}

impl DownloadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadState::Succeeded(_) | DownloadState::Failed(_))
    }
}

/// Why one attempt did not produce a valid file.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("transport error: {0}")]
    Transport(#[from] FetchError),

    #[error("write to {} failed: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("downloaded file failed PDF validation")]
    Corrupt,
}

impl AttemptError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Transport(e) => e.is_retryable(),
            AttemptError::Write { .. } | AttemptError::Corrupt => true,
        }
    }

    fn write(path: &Path, source: std::io::Error) -> Self {
        AttemptError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub target: PdfTarget,
    pub state: DownloadState,
    pub last_error: Option<String>,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.state, DownloadState::Succeeded(_))
    }

    pub fn attempts(&self) -> u32 {
        match self.state {
            DownloadState::Pending => 0,
            DownloadState::Attempting(n)
            | DownloadState::Validating(n)
            | DownloadState::Succeeded(n)
            | DownloadState::Failed(n) => n,
        }
    }
}

/// Aggregated result of one batch, available once every download in it finished.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub success_count: u64,
    pub fail_count: u64,
    pub outcomes: Vec<DownloadOutcome>,
}

impl BatchReport {
    fn push(&mut self, outcome: DownloadOutcome) {
        if outcome.is_success() {
            self.success_count += 1;
        } else {
            self.fail_count += 1;
        }
        self.outcomes.push(outcome);
    }
}

/// Streams PDFs to disk and validates them, retrying each target up to the policy's budget.
pub struct Downloader<T: ?Sized> {
    transport: Arc<T>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<T: ?Sized> Clone for Downloader<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy,
            timeout: self.timeout,
        }
    }
}

impl<T> Downloader<T>
where
    T: Transport + ?Sized + 'static,
{
    pub fn new(transport: Arc<T>, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            transport,
            policy,
            timeout,
        }
    }

    /// Run every target concurrently and wait for all of them. Failures never cancel siblings.
    pub async fn download_batch(&self, targets: Vec<PdfTarget>) -> BatchReport {
        let mut tasks = JoinSet::new();
        for target in targets {
            let downloader = self.clone();
            tasks.spawn(async move { downloader.download_one(&target).await });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.push(outcome),
                Err(e) => error!("Download task join error: {}", e),
            }
        }
        report
    }

    pub async fn download_one(&self, target: &PdfTarget) -> DownloadOutcome {
        let mut state = DownloadState::Pending;
        let mut last_error = None;
        let mut attempt = 0;

        while attempt < self.policy.max_attempts {
            attempt += 1;
            state = DownloadState::Attempting(attempt);

            let result = match self.fetch_to_disk(target).await {
                Ok(()) => {
                    state = DownloadState::Validating(attempt);
                    if validator::is_valid_pdf_async(&target.local_path).await {
                        Ok(())
                    } else {
                        Err(AttemptError::Corrupt)
                    }
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    info!("[Download Success] {} <- {}", target.file_name, target.from_page);
                    return DownloadOutcome {
                        target: target.clone(),
                        state: DownloadState::Succeeded(attempt),
                        last_error: None,
                    };
                }
                Err(e) => {
                    remove_if_present(&target.local_path).await;
                    match &e {
                        AttemptError::Corrupt => {
                            warn!("[Corrupt] {} Retry {}", target.file_name, attempt)
                        }
                        other => {
                            warn!("[Download Err] {} Retry {}: {}", target.file_name, attempt, other)
                        }
                    }

                    let retryable = e.is_retryable();
                    last_error = Some(e.to_string());
                    if !retryable || !self.policy.wait_after(attempt).await {
                        break;
                    }
                }
            }
        }

        debug!("{} ended in {:?}", target.file_name, state);
        error!("[Download Fail] {} after {} attempt(s)", target.file_name, attempt);
        DownloadOutcome {
            target: target.clone(),
            state: DownloadState::Failed(attempt),
            last_error,
        }
    }

    /// One attempt: clean slate, stream the body into the file, flush and sync.
    async fn fetch_to_disk(&self, target: &PdfTarget) -> Result<(), AttemptError> {
        let path = &target.local_path;
        remove_if_present(path).await;

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| AttemptError::write(path, e))?;

        let mut stream = self.transport.open_stream(&target.url, self.timeout).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| AttemptError::write(path, e))?;
        }

        file.flush().await.map_err(|e| AttemptError::write(path, e))?;
        file.sync_all().await.map_err(|e| AttemptError::write(path, e))?;
        Ok(())
    }
}

async fn remove_if_present(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            debug!("Could not remove {}: {}", path.display(), e);
        }
    }
}
