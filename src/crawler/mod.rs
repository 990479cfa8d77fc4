//! Crawler module for authenticated site traversal
//!
//! This module contains the core crawling logic, including:
//! - Request/response exchanges with reconnect-and-retry
//! - The login sequence
//! - Flag, link and form-token extraction
//! - The frontier and visited set
//! - Overall crawl coordination

pub mod auth;
mod coordinator;
mod fetcher;
#[cfg(test)]
pub(crate) mod mock_site;
mod parser;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{FetchResult, Fetcher, RetryPolicy};
pub use parser::{
    extract_csrf_token, extract_flags, extract_links, resolve_location, FLAG_LENGTH,
};
pub use scheduler::Scheduler;
