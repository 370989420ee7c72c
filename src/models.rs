use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A discovered PDF: where it lives, where it goes on disk, and which page linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfTarget {
    pub url: String,
    pub file_name: String,
    pub local_path: PathBuf,
    #[serde(alias = "discoveredFromPage")]
    pub from_page: String,
    #[serde(alias = "pageTitle")]
    pub title: String,
}

impl PdfTarget {
    pub fn new(
        url: String,
        file_name: String,
        download_dir: &Path,
        from_page: String,
        title: String,
    ) -> Self {
        let local_path = download_dir.join(&file_name);
        Self {
            url,
            file_name,
            local_path,
            from_page,
            title,
        }
    }
}

/// Whole-run download tallies. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub total_success: u64,
    pub total_fail: u64,
}

impl RunCounters {
    pub fn record(&mut self, success: u64, fail: u64) {
        self.total_success += success;
        self.total_fail += fail;
    }
}

/// What a finished crawl reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages_visited: usize,
    pub pdfs_discovered: usize,
    pub pdfs_downloaded: usize,
    pub total_success: u64,
    pub total_fail: u64,
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pages: {} | PDF found: {} | Downloaded: {} | Success: {} | Fail: {}",
            self.pages_visited,
            self.pdfs_discovered,
            self.pdfs_downloaded,
            self.total_success,
            self.total_fail
        )
    }
}
