//! HTTP fetcher implementation
//!
//! This module performs request/response exchanges for the crawler, including:
//! - Serializing requests with the current session cookies
//! - Reading until a response is fully framed
//! - Updating the session store from Set-Cookie headers
//! - Reconnect-and-resend retries for transport failures
//! - Classifying responses by status code

use crate::http::{self, HttpResponse, RequestBuilder, Status, Transport, TransportError};
use crate::state::Session;
use crate::CrawlError;
use std::time::Duration;

/// Result of a fetch, classified by status code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// 200: the body is scanned for flags and links
    Page {
        /// Page body content
        body: String,
    },

    /// 302: the body is ignored
    Redirect {
        /// Raw Location header value, if the server sent one
        location: Option<String>,
    },

    /// 403: a dead end
    Forbidden,

    /// Any other status
    Other {
        /// The HTTP status code
        status: u16,
    },
}

impl FetchResult {
    pub fn from_response(response: HttpResponse) -> Self {
        match response.status() {
            Status::Ok => FetchResult::Page {
                body: response.into_body(),
            },
            Status::Found => FetchResult::Redirect {
                location: response.location().map(str::to_string),
            },
            Status::Forbidden => FetchResult::Forbidden,
            Status::Other(status) => FetchResult::Other { status },
        }
    }

    /// Body to scan for content; empty for everything but a 200
    pub fn body_for_scan(&self) -> &str {
        match self {
            FetchResult::Page { body } => body,
            _ => "",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            FetchResult::Page { .. } => 200,
            FetchResult::Redirect { .. } => 302,
            FetchResult::Forbidden => 403,
            FetchResult::Other { status } => *status,
        }
    }
}

/// How often, and how patiently, a failed exchange is reissued
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per request, the first one included
    pub max_attempts: u32,

    /// Pause before reissuing
    pub delay: Duration,
}

/// Issues requests over one transport and keeps the session up to date
pub struct Fetcher {
    transport: Transport,
    requests: RequestBuilder,
    session: Session,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Transport, requests: RequestBuilder, retry: RetryPolicy) -> Self {
        Self {
            transport,
            requests,
            session: Session::new(),
            retry,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Opens a fresh connection
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        self.transport.connect().await
    }

    pub async fn close(&mut self) {
        self.transport.close().await;
    }

    /// Fetches `path` with a GET
    pub async fn fetch(&mut self, path: &str) -> Result<FetchResult, CrawlError> {
        let request = self.requests.build_get(path, &self.session);
        let response = self.exchange(path, &request).await?;
        Ok(FetchResult::from_response(response))
    }

    /// Submits the login form
    ///
    /// The site drops the connection after serving the form, so the POST
    /// always goes out on a fresh connection.
    pub async fn submit_login(
        &mut self,
        path: &str,
        username: &str,
        password: &str,
        csrf_token: &str,
    ) -> Result<FetchResult, CrawlError> {
        let request =
            self.requests
                .build_login(path, username, password, csrf_token, &self.session);
        self.transport.close().await;
        let response = self.exchange(path, &request).await?;
        Ok(FetchResult::from_response(response))
    }

    /// Sends `request` until a well-formed response comes back
    ///
    /// Transport failures and malformed responses drop the connection and
    /// reissue the whole request on a new one, up to the retry limit.
    async fn exchange(&mut self, path: &str, request: &[u8]) -> Result<HttpResponse, CrawlError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_exchange(request).await {
                Ok(response) => {
                    self.session.absorb(response.set_cookies());
                    if response.closes_connection() {
                        self.transport.close().await;
                    }
                    tracing::trace!("{} -> {}", path, response.status_code());
                    return Ok(response);
                }
                Err(err) if err.is_retryable() => {
                    self.transport.close().await;
                    if attempt >= self.retry.max_attempts {
                        return Err(CrawlError::RetriesExhausted {
                            path: path.to_string(),
                            attempts: attempt,
                            reason: err.to_string(),
                        });
                    }
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}; reconnecting",
                        attempt,
                        self.retry.max_attempts,
                        path,
                        err
                    );
                    if !self.retry.delay.is_zero() {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_exchange(&mut self, request: &[u8]) -> Result<HttpResponse, CrawlError> {
        if !self.transport.is_connected() {
            self.transport.connect().await?;
        }
        self.transport.send(request).await?;
        let raw = self.read_response().await?;
        Ok(http::parse(&raw)?)
    }

    /// Accumulates chunks until the response is framed
    ///
    /// A peer that closes after sending some data ends the message; what
    /// arrived is handed to the parser as-is.
    async fn read_response(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut raw = Vec::new();
        loop {
            match self.transport.receive().await {
                Ok(chunk) => {
                    raw.extend_from_slice(&chunk);
                    if http::is_complete(&raw) {
                        return Ok(raw);
                    }
                }
                Err(TransportError::Closed) if !raw.is_empty() => {
                    self.transport.close().await;
                    return Ok(raw);
                }
                Err(err) => return Err(err),
            }
        }
    }
}
