//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the traversal engine, which owns every piece of crawl
//! state (session, frontier, visited set, flags) and drives:
//! - The one-time login
//! - The breadth-first fetch loop over internal links
//! - Flag collection and the termination policy
//! - The final report

use crate::config::Config;
use crate::crawler::auth;
use crate::crawler::fetcher::{FetchResult, Fetcher, RetryPolicy};
use crate::crawler::parser::{extract_flags, extract_links, resolve_location};
use crate::crawler::scheduler::Scheduler;
use crate::http::{Connector, RequestBuilder, RustlsConnector, TcpConnector, Transport};
use crate::output::{log_summary, CrawlReport, CrawlStatistics};
use crate::state::{CrawlPhase, Session, Termination};
use crate::CrawlError;
use chrono::Utc;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    fetcher: Fetcher,
    scheduler: Scheduler,
    flags: Vec<String>,
    phase: CrawlPhase,
    statistics: CrawlStatistics,
}

impl Coordinator {
    /// Creates a coordinator that talks to the configured server
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - The host is not a valid TLS server name
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        let server = &config.server;
        let connector: Box<dyn Connector> = if server.tls {
            Box::new(RustlsConnector::new(&server.host, server.port)?)
        } else {
            Box::new(TcpConnector::new(&server.host, server.port))
        };
        Ok(Self::with_connector(config, connector))
    }

    /// Creates a coordinator on top of an arbitrary connector
    pub fn with_connector(config: Config, connector: Box<dyn Connector>) -> Self {
        let transport = Transport::new(
            connector,
            config.crawler.connect_timeout(),
            config.crawler.read_timeout(),
        );
        let requests = RequestBuilder::new(&config.server, &config.crawler.user_agent);
        let retry = RetryPolicy {
            max_attempts: config.crawler.max_attempts,
            delay: config.crawler.retry_delay(),
        };

        Self {
            fetcher: Fetcher::new(transport, requests, retry),
            scheduler: Scheduler::new(),
            flags: Vec::new(),
            phase: CrawlPhase::Authenticating,
            statistics: CrawlStatistics::default(),
            config,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Flags collected so far, in discovery order
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn session(&self) -> &Session {
        self.fetcher.session()
    }

    /// Runs the crawl to completion
    ///
    /// This method:
    /// 1. Logs in
    /// 2. Seeds the frontier with the home page
    /// 3. Fetches paths in FIFO order until the target flag count is
    ///    reached or the frontier empties
    /// 4. Returns the report
    ///
    /// A coordinator runs once; a second call fails with `InvalidTransition`.
    pub async fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        if self.phase != CrawlPhase::Authenticating {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Crawling,
            });
        }

        let started_at = Utc::now();
        let start_time = std::time::Instant::now();

        if let Err(e) = self.fetcher.connect().await {
            tracing::warn!("Initial connection failed: {}; will retry on first request", e);
        }

        auth::login(
            &mut self.fetcher,
            &self.config.crawler.login_path,
            &self.config.credentials,
        )
        .await?;

        self.phase.transition_to(CrawlPhase::Crawling)?;
        self.scheduler.enqueue(self.config.crawler.home_path.clone());

        let target = self.config.crawler.target_flags;
        tracing::info!(
            "Crawling from {} for {} flags",
            self.config.crawler.home_path,
            target
        );

        let termination = loop {
            if self.flags.len() >= target {
                break Termination::TargetReached;
            }

            let path = match self.scheduler.next_path() {
                Some(path) => path,
                None => break Termination::FrontierExhausted,
            };

            self.process_path(&path).await?;

            let visited = self.scheduler.visited_count();
            if visited % 100 == 0 {
                tracing::info!(
                    "Progress: {} pages visited, {} in frontier, {} flags, {:.2} pages/sec",
                    visited,
                    self.scheduler.frontier_size(),
                    self.flags.len(),
                    visited as f64 / start_time.elapsed().as_secs_f64()
                );
            }
        };

        self.phase.transition_to(CrawlPhase::Finished)?;
        self.fetcher.close().await;

        let report = CrawlReport {
            flags: self.flags.clone(),
            target,
            termination,
            statistics: self.statistics.clone(),
            frontier_remaining: self.scheduler.frontier_size(),
            started_at,
            finished_at: Utc::now(),
        };
        log_summary(&report);

        Ok(report)
    }

    /// Fetches one path and acts on the response
    ///
    /// A path that runs out of retries is recorded as failed and skipped.
    async fn process_path(&mut self, path: &str) -> Result<(), CrawlError> {
        tracing::debug!("Fetching {}", path);

        let result = match self.fetcher.fetch(path).await {
            Ok(result) => result,
            Err(CrawlError::RetriesExhausted {
                path,
                attempts,
                reason,
            }) => {
                tracing::warn!(
                    "Giving up on {} after {} attempts: {}",
                    path,
                    attempts,
                    reason
                );
                self.statistics.record_failure(&path);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.statistics.record_status(result.status_code());

        match result {
            FetchResult::Page { body } => {
                for flag in extract_flags(&body) {
                    self.flags.push(flag);
                    tracing::info!(
                        "Found flag {}/{} on {}",
                        self.flags.len(),
                        self.config.crawler.target_flags,
                        path
                    );
                }

                let links = extract_links(&body, &self.config.crawler.link_prefix);
                self.statistics.record_links(links.len());
                self.scheduler.enqueue_all(links);
            }

            FetchResult::Redirect {
                location: Some(location),
            } => match resolve_location(&location, &self.config.server) {
                Some(target) => {
                    tracing::debug!("{} redirects to {}", path, target);
                    self.statistics.record_redirect();
                    self.scheduler.enqueue(target);
                }
                None => {
                    tracing::debug!("Ignoring off-site redirect from {} to {}", path, location);
                }
            },

            FetchResult::Redirect { location: None } => {
                tracing::debug!("{} redirected without a Location", path);
            }

            FetchResult::Forbidden => {
                tracing::debug!("{} is forbidden", path);
            }

            FetchResult::Other { status } => {
                tracing::debug!("{} returned HTTP {}", path, status);
            }
        }

        Ok(())
    }
}

/// Runs the main crawl operation
///
/// # Arguments
///
/// * `config` - The crawler configuration, already validated
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The traversal ended; the report may still be short of flags
/// * `Err(CrawlError)` - Login failed or the connector could not be built
///
/// # Example
///
/// ```no_run
/// use fakebook_crawler::config::Config;
/// use fakebook_crawler::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.credentials.username = "alice".to_string();
/// config.credentials.password = "secret".to_string();
/// let report = run_crawl(config).await?;
/// for flag in report.verify()? {
///     println!("{}", flag);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport, CrawlError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
