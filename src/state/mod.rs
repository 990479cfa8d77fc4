//! State management for a crawl
//!
//! This module contains the session store (cookie-carried tokens) and the
//! phase state machine driven by the traversal engine.

mod phase;
mod session;

pub use phase::{CrawlPhase, Termination};
pub use session::Session;
