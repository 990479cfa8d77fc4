//! Login sequence
//!
//! Fetches the login form, lifts its anti-forgery token and posts the
//! credentials back. The outcome of the POST is not checked: a rejected
//! login shows up later as pages that yield nothing.

use crate::config::Credentials;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::parser::extract_csrf_token;
use crate::CrawlError;

/// Runs the login flow against `login_path`
///
/// # Arguments
///
/// * `fetcher` - Fetcher whose session receives the login cookies
/// * `login_path` - Path serving the login form, also the POST target
/// * `credentials` - Username and password to submit
///
/// # Returns
///
/// * `Ok(FetchResult)` - The response to the login POST
/// * `Err(CrawlError)` - The form had no token, or a request ran out of retries
pub async fn login(
    fetcher: &mut Fetcher,
    login_path: &str,
    credentials: &Credentials,
) -> Result<FetchResult, CrawlError> {
    tracing::info!("Fetching login form at {}", login_path);
    let form = fetcher.fetch(login_path).await?;

    let token = extract_csrf_token(form.body_for_scan()).ok_or_else(|| {
        CrawlError::LoginFormParseFailure {
            path: login_path.to_string(),
        }
    })?;
    tracing::debug!("Found login form token ({} chars)", token.len());

    let result = fetcher
        .submit_login(
            login_path,
            &credentials.username,
            &credentials.password,
            &token,
        )
        .await?;

    if fetcher.session().is_authenticated() {
        tracing::info!("Logged in as {}", credentials.username);
    } else {
        tracing::warn!(
            "Login response (status {}) set no session cookie; continuing anyway",
            result.status_code()
        );
    }

    Ok(result)
}
