//! Crawl statistics
//!
//! Counters collected by the traversal loop while it runs, and a tracing
//! dump of them at the end of a crawl.

use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Fetches that produced a response
    pub pages_fetched: u64,

    /// Count of responses by status code
    pub pages_by_status: BTreeMap<u16, u64>,

    /// Internal links found, duplicates included
    pub links_discovered: u64,

    /// Redirect targets that were queued
    pub redirects_followed: u64,

    /// Paths abandoned after running out of retries
    pub failed_paths: Vec<String>,
}

impl CrawlStatistics {
    pub fn record_status(&mut self, status: u16) {
        self.pages_fetched += 1;
        *self.pages_by_status.entry(status).or_insert(0) += 1;
    }

    pub fn record_links(&mut self, count: usize) {
        self.links_discovered += count as u64;
    }

    pub fn record_redirect(&mut self) {
        self.redirects_followed += 1;
    }

    pub fn record_failure(&mut self, path: &str) {
        self.failed_paths.push(path.to_string());
    }

    /// Number of responses with the given status
    pub fn count_for(&self, status: u16) -> u64 {
        self.pages_by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Logs statistics at info level
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn log_statistics(stats: &CrawlStatistics) {
    tracing::info!(
        "Pages fetched: {}, links discovered: {}, redirects followed: {}",
        stats.pages_fetched,
        stats.links_discovered,
        stats.redirects_followed
    );

    for (status, count) in &stats.pages_by_status {
        let percentage = if stats.pages_fetched > 0 {
            (*count as f64 / stats.pages_fetched as f64) * 100.0
        } else {
            0.0
        };
        tracing::info!("  HTTP {}: {} ({:.1}%)", status, count, percentage);
    }

    if !stats.failed_paths.is_empty() {
        tracing::warn!("Gave up on {} paths:", stats.failed_paths.len());
        for path in &stats.failed_paths {
            tracing::warn!("  - {}", path);
        }
    }
}
