//! Output module for crawl results and summaries
//!
//! This module handles:
//! - The report a finished crawl returns
//! - Printing flags for the caller
//! - Recording crawl statistics

mod report;
pub mod stats;

pub use report::{log_summary, write_flags, CrawlReport, ERROR_INDICATOR};
pub use stats::{log_statistics, CrawlStatistics};
