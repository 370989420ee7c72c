//! Resume file and final catalog persistence.
//!
//! The resume file is a plain JSON projection of the crawler's frontier,
//! registry and counters. It is rewritten wholesale on each save through a
//! temp file and a rename, so an interrupted save leaves the previous
//! checkpoint intact.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::frontier::Frontier;
use crate::models::{PdfTarget, RunCounters};
use crate::registry::PdfRegistry;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt checkpoint {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CheckpointError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Serializable projection of the crawl state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSnapshot {
    pub queue_url: Vec<String>,
    pub visited_url: Vec<String>,
    pub pdf_info_list: Vec<PdfTarget>,
    pub pdf_done: Vec<String>,
    #[serde(default)]
    pub total_success: u64,
    #[serde(default)]
    pub total_fail: u64,
    #[serde(default)]
    pub pdf_failed: Vec<String>,
}

impl CheckpointSnapshot {
    pub fn capture(frontier: &Frontier, registry: &PdfRegistry, counters: &RunCounters) -> Self {
        Self {
            queue_url: frontier.queued_urls(),
            visited_url: frontier.visited_urls(),
            pdf_info_list: registry.targets().to_vec(),
            pdf_done: registry.completed_files(),
            total_success: counters.total_success,
            total_fail: counters.total_fail,
            pdf_failed: registry.failed_urls(),
        }
    }

    pub fn into_parts(self) -> (Frontier, PdfRegistry, RunCounters) {
        let frontier = Frontier::restore(self.queue_url, self.visited_url);
        let registry = PdfRegistry::restore(self.pdf_info_list, self.pdf_done, self.pdf_failed);
        let counters = RunCounters {
            total_success: self.total_success,
            total_fail: self.total_fail,
        };
        (frontier, registry, counters)
    }
}

/// Owns the resume file and the metadata catalog paths. Single writer.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    resume_path: PathBuf,
    metadata_path: PathBuf,
}

impl CheckpointManager {
    pub fn new(resume_path: impl Into<PathBuf>, metadata_path: impl Into<PathBuf>) -> Self {
        Self {
            resume_path: resume_path.into(),
            metadata_path: metadata_path.into(),
        }
    }

    pub fn resume_path(&self) -> &Path {
        &self.resume_path
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub async fn save(&self, snapshot: &CheckpointSnapshot) -> Result<(), CheckpointError> {
        let json = serde_json::to_vec(snapshot)?;
        write_replacing(&self.resume_path, &json).await?;
        debug!(
            "Checkpoint saved: {} queued, {} visited, {} PDFs",
            snapshot.queue_url.len(),
            snapshot.visited_url.len(),
            snapshot.pdf_info_list.len()
        );
        Ok(())
    }

    /// `Ok(None)` means there is nothing to resume.
    pub async fn load_if_present(&self) -> Result<Option<CheckpointSnapshot>, CheckpointError> {
        let raw = match tokio::fs::read(&self.resume_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CheckpointError::io(&self.resume_path, e)),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| CheckpointError::Corrupt {
                path: self.resume_path.clone(),
                source,
            })
    }

    /// Write the full catalog, then drop the resume file. Marks natural completion.
    pub async fn finalize_success(&self, catalog: &[PdfTarget]) -> Result<(), CheckpointError> {
        let json = serde_json::to_vec_pretty(catalog)?;
        write_replacing(&self.metadata_path, &json).await?;

        match tokio::fs::remove_file(&self.resume_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CheckpointError::io(&self.resume_path, e)),
        }
    }
}

async fn write_replacing(path: &Path, contents: &[u8]) -> Result<(), CheckpointError> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| CheckpointError::io(&tmp_path, e))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| CheckpointError::io(path, e))
}
