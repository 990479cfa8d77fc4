use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Default host crawled when none is configured
pub const DEFAULT_SERVER: &str = "project5.3700.network";

/// Default HTTPS port
pub const DEFAULT_PORT: u16 = 443;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Target server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname to connect to (also sent as the Host header)
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Wrap the connection in TLS
    pub tls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
            tls: true,
        }
    }
}

impl ServerConfig {
    /// Scheme matching the transport, used for Referer and redirect resolution
    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }

    /// Value for the Host header; the port is omitted when it is the scheme default
    pub fn authority(&self) -> String {
        let default_port = if self.tls { 443 } else { 80 };
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Origin URL of the site, e.g. `https://example.com/`
    pub fn origin(&self) -> String {
        format!("{}://{}/", self.scheme(), self.authority())
    }
}

/// Login credentials
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of flags after which the crawl stops
    #[serde(rename = "target-flags")]
    pub target_flags: usize,

    /// Attempts per request before the request is reported as failed
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Pause between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Connect timeout (milliseconds)
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,

    /// Timeout for a single read or write (milliseconds)
    #[serde(rename = "read-timeout-ms")]
    pub read_timeout_ms: u64,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Path of the login form, also the POST target
    #[serde(rename = "login-path")]
    pub login_path: String,

    /// First page of the traversal
    #[serde(rename = "home-path")]
    pub home_path: String,

    /// Only anchors whose path starts with this prefix are followed
    #[serde(rename = "link-prefix")]
    pub link_prefix: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            target_flags: 5,
            max_attempts: 10,
            retry_delay_ms: 250,
            connect_timeout_ms: 10_000,
            read_timeout_ms: 15_000,
            user_agent: concat!("fakebook-crawler/", env!("CARGO_PKG_VERSION")).to_string(),
            login_path: "/accounts/login/?next=/fakebook/".to_string(),
            home_path: "/fakebook/".to_string(),
            link_prefix: "/fakebook".to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
