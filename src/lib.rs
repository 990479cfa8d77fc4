//! Fakebook crawler: a session-aware flag hunter
//!
//! This crate logs into a session-based website over a raw HTTP/1.1 connection,
//! walks the site's internal links breadth-first, and collects the secret flags
//! embedded in its pages.

pub mod config;
pub mod crawler;
pub mod http;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection failure: {0}")]
    Transport(#[from] http::TransportError),

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] http::ParseError),

    #[error("Login form at {path} has no csrfmiddlewaretoken field")]
    LoginFormParseFailure { path: String },

    #[error("Giving up on {path} after {attempts} attempts: {reason}")]
    RetriesExhausted {
        path: String,
        attempts: u32,
        reason: String,
    },

    #[error("Found {found} flags, expected {expected}")]
    IncompleteResult { found: usize, expected: usize },

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Returns true for failures that are recovered by reconnecting and
    /// reissuing the whole request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::MalformedResponse(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid host in config: {0}")]
    InvalidHost(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator};
pub use output::CrawlReport;
pub use state::{CrawlPhase, Session};
