//! Raw HTTP/1.1 request serialization
//!
//! Requests are assembled by hand so the exact header set, cookie layout and
//! body length are under our control.

use crate::config::ServerConfig;
use crate::state::Session;
use url::form_urlencoded;

/// Serializes GET and login POST requests for one site
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    host: String,
    user_agent: String,
    referer: String,
}

impl RequestBuilder {
    pub fn new(server: &ServerConfig, user_agent: &str) -> Self {
        Self {
            host: server.authority(),
            user_agent: user_agent.to_string(),
            referer: server.origin(),
        }
    }

    /// Builds a GET request for `path`
    ///
    /// The Cookie header is present only when the session holds at least one
    /// token.
    pub fn build_get(&self, path: &str, session: &Session) -> Vec<u8> {
        let mut request = format!("GET {} HTTP/1.1\r\n", path);
        self.push_common_headers(&mut request);
        if let Some(cookie) = session.cookie_header() {
            push_header(&mut request, "Cookie", &cookie);
        }
        push_header(&mut request, "Connection", "keep-alive");
        request.push_str("\r\n");
        request.into_bytes()
    }

    /// Builds the login form submission
    ///
    /// `csrf_token` is the hidden form value; the Cookie header carries only
    /// the session's csrftoken because no session id exists yet.
    pub fn build_login(
        &self,
        path: &str,
        username: &str,
        password: &str,
        csrf_token: &str,
        session: &Session,
    ) -> Vec<u8> {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", password)
            .append_pair("csrfmiddlewaretoken", csrf_token)
            .finish();

        let mut request = format!("POST {} HTTP/1.1\r\n", path);
        self.push_common_headers(&mut request);
        push_header(&mut request, "Connection", "keep-alive");
        if let Some(cookie) = session.login_cookie_header() {
            push_header(&mut request, "Cookie", &cookie);
        }
        push_header(
            &mut request,
            "Content-Type",
            "application/x-www-form-urlencoded",
        );
        push_header(&mut request, "Content-Length", &body.len().to_string());
        request.push_str("\r\n");
        request.push_str(&body);
        request.into_bytes()
    }

    fn push_common_headers(&self, request: &mut String) {
        push_header(request, "Host", &self.host);
        push_header(request, "User-Agent", &self.user_agent);
        push_header(request, "Accept", "*/*");
        push_header(request, "Referer", &self.referer);
    }
}

fn push_header(request: &mut String, name: &str, value: &str) {
    request.push_str(name);
    request.push_str(": ");
    request.push_str(value);
    request.push_str("\r\n");
}
