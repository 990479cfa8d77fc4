use crate::config::types::{Config, CrawlerConfig, Credentials, ServerConfig};
use crate::ConfigError;
use url::Host;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_credentials(&config.credentials)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates the target server
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.host.is_empty() {
        return Err(ConfigError::InvalidHost("host cannot be empty".to_string()));
    }

    Host::parse(&config.host)
        .map_err(|e| ConfigError::InvalidHost(format!("'{}': {}", config.host, e)))?;

    if config.port == 0 {
        return Err(ConfigError::Validation("port must be non-zero".to_string()));
    }

    Ok(())
}

/// Validates the login credentials
fn validate_credentials(credentials: &Credentials) -> Result<(), ConfigError> {
    if credentials.username.is_empty() {
        return Err(ConfigError::Validation(
            "username cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl behavior settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.target_flags == 0 {
        return Err(ConfigError::Validation(
            "target_flags must be >= 1".to_string(),
        ));
    }

    if config.max_attempts == 0 {
        return Err(ConfigError::Validation(
            "max_attempts must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_ms == 0 || config.read_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be greater than 0ms".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    validate_path("login_path", &config.login_path)?;
    validate_path("home_path", &config.home_path)?;
    validate_path("link_prefix", &config.link_prefix)?;

    Ok(())
}

/// Paths are sent verbatim on the request line, so they must be origin-relative
fn validate_path(name: &str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start with '/', got '{}'",
            name, path
        )));
    }

    if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "{} must not contain whitespace, got '{}'",
            name, path
        )));
    }

    Ok(())
}
