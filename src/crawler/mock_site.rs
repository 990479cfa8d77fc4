//! In-memory site for exercising the crawler without a network
//!
//! Each connection is a tokio duplex pipe served by a spawned task that
//! parses requests and answers from a route table. Routes hold a queue of
//! replies: all but the last are used once, the last one repeats.

use crate::http::{BoxedStream, Connector, TransportError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

pub const LOGIN_PATH: &str = "/accounts/login/?next=/fakebook/";
pub const FORM_TOKEN: &str = "form-token";
pub const PRE_LOGIN_CSRF: &str = "pre-login";
pub const POST_LOGIN_CSRF: &str = "post-login";
pub const SESSION_ID: &str = "session-1";

const TRICKLE_PAUSE: Duration = Duration::from_millis(50);

/// What the server does with a request
#[derive(Debug, Clone)]
pub enum Reply {
    /// Write the raw response and keep the connection open
    Respond(String),
    /// Write the raw response, then close
    RespondAndHangup(String),
    /// Write each part in its own write with a pause in between, then close
    Trickle(Vec<String>),
    /// Close without answering
    Hangup,
}

/// A request as the server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub head: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.head
            .split("\r\n")
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim().to_string())
    }
}

#[derive(Default)]
struct SiteState {
    routes: Mutex<HashMap<String, Vec<Reply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    connects: AtomicUsize,
    refused_connects: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MockSite {
    state: Arc<SiteState>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for `method path`
    pub fn route(&self, method: &str, path: &str, reply: Reply) -> &Self {
        self.state
            .routes
            .lock()
            .unwrap()
            .entry(route_key(method, path))
            .or_default()
            .push(reply);
        self
    }

    /// Serves `html` with a 200 for GET `path`
    pub fn page(&self, path: &str, html: &str) -> &Self {
        self.route("GET", path, Reply::Respond(ok(html)))
    }

    /// Installs the standard login form and a login POST that sets a session
    pub fn with_login(&self) -> &Self {
        self.route(
            "GET",
            LOGIN_PATH,
            Reply::Respond(response(
                "200 OK",
                &[(
                    "Set-Cookie",
                    &format!("csrftoken={}; Path=/; SameSite=Lax", PRE_LOGIN_CSRF),
                )],
                &login_form(FORM_TOKEN),
            )),
        );
        self.route(
            "POST",
            LOGIN_PATH,
            Reply::Respond(response(
                "302 Found",
                &[
                    ("Location", "/fakebook/"),
                    (
                        "Set-Cookie",
                        &format!("csrftoken={}; Path=/; SameSite=Lax", POST_LOGIN_CSRF),
                    ),
                    (
                        "Set-Cookie",
                        &format!("sessionid={}; HttpOnly; Path=/", SESSION_ID),
                    ),
                ],
                "",
            )),
        )
    }

    /// Makes the next `count` connection attempts fail
    pub fn refuse_connects(&self, count: usize) {
        self.state.refused_connects.store(count, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Paths of every GET except the login form, in arrival order
    pub fn get_paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == "GET" && request.path != LOGIN_PATH)
            .map(|request| request.path)
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    fn next_reply(&self, method: &str, path: &str) -> Reply {
        let mut routes = self.state.routes.lock().unwrap();
        match routes.get_mut(&route_key(method, path)) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::Respond(response("404 Not Found", &[], "not found")),
        }
    }

    fn record(&self, request: RecordedRequest) {
        self.state.requests.lock().unwrap().push(request);
    }
}

#[async_trait]
impl Connector for MockSite {
    async fn connect(&self) -> Result<BoxedStream, TransportError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);

        let refused = self.state.refused_connects.load(Ordering::SeqCst);
        if refused > 0 {
            self.state
                .refused_connects
                .store(refused - 1, Ordering::SeqCst);
            return Err(TransportError::Connect {
                addr: self.endpoint(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            });
        }

        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(serve(server, self.clone()));
        Ok(Box::new(client))
    }

    fn endpoint(&self) -> String {
        "mock://fakebook.test".to_string()
    }
}

async fn serve(mut stream: DuplexStream, site: MockSite) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        while let Some(request) = take_request(&mut buffer) {
            let reply = site.next_reply(&request.method, &request.path);
            site.record(request);
            match reply {
                Reply::Respond(raw) => {
                    if stream.write_all(raw.as_bytes()).await.is_err() {
                        return;
                    }
                }
                Reply::RespondAndHangup(raw) => {
                    let _ = stream.write_all(raw.as_bytes()).await;
                    return;
                }
                Reply::Trickle(parts) => {
                    for part in parts {
                        if stream.write_all(part.as_bytes()).await.is_err() {
                            return;
                        }
                        tokio::time::sleep(TRICKLE_PAUSE).await;
                    }
                    return;
                }
                Reply::Hangup => return,
            }
        }

        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Removes one complete request from the front of `buffer`
fn take_request(buffer: &mut Vec<u8>) -> Option<RecordedRequest> {
    let head_end = buffer.windows(4).position(|window| window == b"\r\n\r\n")?;
    let head = String::from_utf8_lossy(&buffer[..head_end]).into_owned();

    let length = head
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let total = head_end + 4 + length;
    if buffer.len() < total {
        return None;
    }

    let body = String::from_utf8_lossy(&buffer[head_end + 4..total]).into_owned();
    let mut request_line = head.split("\r\n").next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    buffer.drain(..total);

    Some(RecordedRequest {
        method,
        path,
        head,
        body,
    })
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method, path)
}

/// Raw response with a Content-Length matching `body`
pub fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut raw = format!("HTTP/1.1 {}\r\n", status);
    for (name, value) in headers {
        raw.push_str(&format!("{}: {}\r\n", name, value));
    }
    raw.push_str(&format!("Content-Length: {}\r\n\r\n{}", body.len(), body));
    raw
}

pub fn ok(body: &str) -> String {
    response("200 OK", &[("Content-Type", "text/html; charset=utf-8")], body)
}

pub fn login_form(token: &str) -> String {
    format!(
        r#"<html><body><form method="post" action="/accounts/login/?next=/fakebook/">
<input type="hidden" name="csrfmiddlewaretoken" value="{}">
<input type="text" name="username"><input type="password" name="password">
</form></body></html>"#,
        token
    )
}

/// A 64-character flag made of one repeated character
pub fn flag(c: char) -> String {
    std::iter::repeat(c).take(64).collect()
}

/// A page linking to `links` and showing `flags`
pub fn page_html(links: &[&str], flags: &[&str]) -> String {
    let mut html = String::from("<html><body><ul>\n");
    for link in links {
        html.push_str(&format!("<li><a href=\"{}\">friend</a></li>\n", link));
    }
    html.push_str("</ul>\n");
    for value in flags {
        html.push_str(&format!(
            "<h3 class='secret_flag' style=\"color:red\">FLAG: {}</h3>\n",
            value
        ));
    }
    html.push_str("</body></html>");
    html
}
