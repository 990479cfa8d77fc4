//! HTML extraction for crawled pages
//!
//! This module pulls out the three things the crawler needs from a body:
//! - Internal links to follow (from <a> tags under the site's path prefix)
//! - The login form's hidden csrfmiddlewaretoken
//! - Secret flags
//!
//! It also resolves redirect targets back to request paths.

use crate::config::ServerConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Length of a flag payload
pub const FLAG_LENGTH: usize = 64;

static FLAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"<h3 class=.secret_flag[^>]*>FLAG: (.{{{}}})</h3>",
        FLAG_LENGTH
    );
    Regex::new(&pattern).expect("valid flag pattern")
});

/// Extracts every flag in the body, in document order
///
/// A flag is the 64-character payload of
/// `<h3 class="secret_flag" ...>FLAG: <payload></h3>`.
pub fn extract_flags(body: &str) -> Vec<String> {
    FLAG_PATTERN
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extracts the paths of anchors that point into the site's own namespace
///
/// Only hrefs that start with `prefix` and go beyond it are kept; fragments
/// are dropped since they never reach the server. Duplicates are preserved.
pub fn extract_links(body: &str, prefix: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(path) = internal_path(href, prefix) {
                    links.push(path);
                }
            }
        }
    }

    links
}

fn internal_path(href: &str, prefix: &str) -> Option<String> {
    let href = href.trim();
    let path = href.split('#').next().unwrap_or_default();

    if path.len() <= prefix.len() || !path.starts_with(prefix) {
        return None;
    }

    Some(path.to_string())
}

/// Extracts the hidden anti-forgery token from the login form
pub fn extract_csrf_token(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse(r#"input[name="csrfmiddlewaretoken"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("value"))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Resolves a Location header value to a request path on the crawled server
///
/// Relative targets are resolved against the site origin. Targets on any
/// other host or port are rejected, as is anything that does not parse.
pub fn resolve_location(location: &str, server: &ServerConfig) -> Option<String> {
    let base = Url::parse(&server.origin()).ok()?;
    let target = base.join(location.trim()).ok()?;

    let same_host = target
        .host_str()
        .map(|host| host.eq_ignore_ascii_case(&server.host))
        .unwrap_or(false);
    if !same_host || target.port_or_known_default() != Some(server.port) {
        return None;
    }

    let mut path = target.path().to_string();
    if let Some(query) = target.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path)
}
