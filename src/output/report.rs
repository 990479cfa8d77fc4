//! Final crawl report and result printing

use crate::output::stats::{log_statistics, CrawlStatistics};
use crate::state::Termination;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use std::io::{self, Write};

/// Line printed ahead of the flags when the count is off
pub const ERROR_INDICATOR: &str = "ERROR";

/// Everything a finished crawl hands back to its caller
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Flags in discovery order
    pub flags: Vec<String>,

    /// Number of flags the crawl was looking for
    pub target: usize,

    /// Why the traversal loop stopped
    pub termination: Termination,

    pub statistics: CrawlStatistics,

    /// Entries still queued when the loop stopped
    pub frontier_remaining: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// True when exactly the target number of flags was found
    pub fn is_complete(&self) -> bool {
        self.flags.len() == self.target
    }

    /// Returns the flags, or `IncompleteResult` when the count is off
    pub fn verify(&self) -> Result<&[String], CrawlError> {
        if self.is_complete() {
            Ok(&self.flags)
        } else {
            Err(CrawlError::IncompleteResult {
                found: self.flags.len(),
                expected: self.target,
            })
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Writes the result for the caller: each flag on its own line, preceded by
/// `ERROR` when the count is not the target
///
/// # Arguments
///
/// * `report` - The finished crawl
/// * `out` - Destination, normally stdout
pub fn write_flags<W: Write>(report: &CrawlReport, out: &mut W) -> io::Result<()> {
    if !report.is_complete() {
        writeln!(out, "{}", ERROR_INDICATOR)?;
    }
    for flag in &report.flags {
        writeln!(out, "{}", flag)?;
    }
    out.flush()
}

/// Logs a summary of the crawl
pub fn log_summary(report: &CrawlReport) {
    let elapsed = report.elapsed();
    tracing::info!(
        "Crawl finished ({}): {} of {} flags in {}.{:03}s, {} paths left in frontier",
        report.termination,
        report.flags.len(),
        report.target,
        elapsed.num_seconds(),
        elapsed.num_milliseconds().rem_euclid(1000),
        report.frontier_remaining
    );
    log_statistics(&report.statistics);

    if let Err(e) = report.verify() {
        tracing::error!("{}", e);
    }
}
