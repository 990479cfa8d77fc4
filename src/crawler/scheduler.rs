//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - FIFO queue management for paths to crawl (breadth-first order)
//! - The visited set, the only authority on "already processed"
//!
//! Discovered paths are appended even when they are already queued or
//! visited; duplicates are discarded when they reach the head of the queue.

use std::collections::{HashSet, VecDeque};

/// Scheduler owns the frontier queue and the visited set
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Paths awaiting a fetch, oldest first
    frontier: VecDeque<String>,

    /// Paths already handed out for fetching
    visited: HashSet<String>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a path to the back of the frontier
    pub fn enqueue(&mut self, path: impl Into<String>) {
        self.frontier.push_back(path.into());
    }

    /// Appends every path, preserving their order
    pub fn enqueue_all<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.frontier.extend(paths);
    }

    /// Gets the next path to fetch
    ///
    /// Pops the head of the frontier, silently discarding paths that were
    /// already visited, and marks the returned path as visited.
    ///
    /// # Returns
    ///
    /// * `Some(String)` - A path that has never been fetched
    /// * `None` - The frontier is exhausted
    pub fn next_path(&mut self) -> Option<String> {
        while let Some(path) = self.frontier.pop_front() {
            if self.visited.contains(&path) {
                tracing::trace!("Skipping already visited path {}", path);
                continue;
            }
            self.visited.insert(path.clone());
            return Some(path);
        }
        None
    }

    /// Number of queued entries, duplicates included
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
