use std::collections::{HashMap, HashSet};

use crate::models::PdfTarget;

/// Every PDF target seen so far, keyed by URL, plus the download outcome per target.
///
/// Targets are never removed. A file name enters `completed` only after it
/// validated on disk.
#[derive(Debug, Default, Clone)]
pub struct PdfRegistry {
    targets: Vec<PdfTarget>,
    index: HashMap<String, usize>,
    completed: HashSet<String>,
    failed: HashSet<String>,
}

impl PdfRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(targets: Vec<PdfTarget>, completed: Vec<String>, failed: Vec<String>) -> Self {
        let mut registry = Self::new();
        for target in targets {
            registry.register(target);
        }
        registry.completed = completed.into_iter().collect();
        registry.failed = failed.into_iter().collect();
        registry
    }

    /// Record `target` unless its URL is already known. Returns whether it was new.
    pub fn register(&mut self, target: PdfTarget) -> bool {
        if self.index.contains_key(&target.url) {
            return false;
        }
        self.index.insert(target.url.clone(), self.targets.len());
        self.targets.push(target);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&PdfTarget> {
        self.index.get(url).map(|&i| &self.targets[i])
    }

    pub fn mark_complete(&mut self, file_name: impl Into<String>) {
        self.completed.insert(file_name.into());
    }

    /// Exhausted all attempts. A later success for the same file name still counts.
    pub fn mark_failed(&mut self, url: impl Into<String>) {
        self.failed.insert(url.into());
    }

    pub fn is_complete(&self, file_name: &str) -> bool {
        self.completed.contains(file_name)
    }

    /// Registered targets with no recorded outcome, in discovery order.
    pub fn pending_downloads(&self) -> Vec<PdfTarget> {
        self.targets
            .iter()
            .filter(|t| !self.completed.contains(&t.file_name) && !self.failed.contains(&t.url))
            .cloned()
            .collect()
    }

    pub fn targets(&self) -> &[PdfTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    pub fn completed_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.completed.iter().cloned().collect();
        files.sort();
        files
    }

    pub fn failed_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.failed.iter().cloned().collect();
        urls.sort();
        urls
    }
}
