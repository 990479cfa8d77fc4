//! Session store for the two cookie-carried tokens
//!
//! The crawler only cares about Django's `csrftoken` and `sessionid`. Both
//! start empty and are only ever overwritten by non-empty values taken from
//! `Set-Cookie` headers, so a response that omits a token never logs us out.

use once_cell::sync::Lazy;
use regex::Regex;

static CSRF_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bcsrftoken=([^;]*)").expect("valid csrftoken pattern"));

static SESSION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsessionid=([^;]*)").expect("valid sessionid pattern"));

/// Authentication state shared by every request of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    csrf_token: String,
    session_id: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The anti-forgery token last handed out by the server
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// The session id set by a successful login
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// True once the server has issued a session id
    pub fn is_authenticated(&self) -> bool {
        !self.session_id.is_empty()
    }

    /// Applies one `Set-Cookie` header value
    ///
    /// Tokens missing from the value, or present with an empty value, leave
    /// the stored token untouched.
    pub fn apply_set_cookie(&mut self, value: &str) {
        if let Some(token) = capture(&CSRF_TOKEN, value) {
            self.csrf_token = token.to_string();
        }
        if let Some(id) = capture(&SESSION_ID, value) {
            self.session_id = id.to_string();
        }
    }

    /// Applies every `Set-Cookie` value of a response, in order
    pub fn absorb<'a, I>(&mut self, set_cookies: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for value in set_cookies {
            self.apply_set_cookie(value);
        }
    }

    /// Cookie header value for ordinary requests
    ///
    /// `None` when neither token is known.
    pub fn cookie_header(&self) -> Option<String> {
        match (self.csrf_token.is_empty(), self.session_id.is_empty()) {
            (true, true) => None,
            (false, true) => Some(format!("csrftoken={}", self.csrf_token)),
            (true, false) => Some(format!("sessionid={}", self.session_id)),
            (false, false) => Some(format!(
                "csrftoken={}; sessionid={}",
                self.csrf_token, self.session_id
            )),
        }
    }

    /// Cookie header value for the login POST, which only carries the csrftoken
    pub fn login_cookie_header(&self) -> Option<String> {
        if self.csrf_token.is_empty() {
            None
        } else {
            Some(format!("csrftoken={}", self.csrf_token))
        }
    }
}

fn capture<'a>(pattern: &Regex, value: &'a str) -> Option<&'a str> {
    pattern
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|token| !token.is_empty())
}
