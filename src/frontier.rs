use std::collections::{HashSet, VecDeque};

/// FIFO of pages awaiting a visit plus the set of pages already visited.
///
/// A visited URL is never queued again and a URL is pending at most once.
/// Owned by the crawler loop alone, so no locking.
#[derive(Debug, Default, Clone)]
pub struct Frontier {
    queue: VecDeque<String>,
    pending: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(start_url: impl Into<String>) -> Self {
        let mut frontier = Self::new();
        frontier.enqueue(start_url);
        frontier
    }

    /// Rebuild from persisted parts. Queue order is kept; duplicates and
    /// already-visited entries are dropped.
    pub fn restore(queue: Vec<String>, visited: Vec<String>) -> Self {
        let mut frontier = Self {
            visited: visited.into_iter().collect(),
            ..Self::default()
        };
        for url in queue {
            frontier.enqueue(url);
        }
        frontier
    }

    /// Queue `url` unless it was visited or is already pending. Returns whether it was added.
    pub fn enqueue(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.visited.contains(&url) || self.pending.contains(&url) {
            return false;
        }
        self.pending.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    pub fn dequeue(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.pending.remove(&url);
        Some(url)
    }

    /// Returns false when the URL had already been visited.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn queued_urls(&self) -> Vec<String> {
        self.queue.iter().cloned().collect()
    }

    /// Visited URLs, sorted so checkpoints are stable between saves.
    pub fn visited_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.visited.iter().cloned().collect();
        urls.sort();
        urls
    }
}
