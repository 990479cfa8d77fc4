//! Configuration module for the crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a file only needs the values that differ from
//! the stock site setup.
//!
//! # Example
//!
//! ```no_run
//! use fakebook_crawler::config::{load_config, validate};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("crawler.toml")).unwrap();
//! config.credentials.username = "alice".to_string();
//! validate(&config).unwrap();
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, Credentials, ServerConfig, DEFAULT_PORT, DEFAULT_SERVER,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
