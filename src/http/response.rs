//! HTTP/1.1 response parsing and framing
//!
//! Raw bytes are split on the first blank line into a header block and a
//! body. [`is_complete`] decides when enough bytes have arrived to stop
//! reading, and [`parse`] turns the bytes into an [`HttpResponse`].

use thiserror::Error;

const HEADER_BOUNDARY: &[u8] = b"\r\n\r\n";

/// Errors produced while parsing a response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no header/body boundary in response")]
    MissingBoundary,

    #[error("unparseable status line: {0:?}")]
    InvalidStatusLine(String),
}

/// The status codes the crawler distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// 200
    Ok,
    /// 302
    Found,
    /// 403
    Forbidden,
    /// Anything else
    Other(u16),
}

impl From<u16> for Status {
    fn from(code: u16) -> Self {
        match code {
            200 => Self::Ok,
            302 => Self::Found,
            403 => Self::Forbidden,
            other => Self::Other(other),
        }
    }
}

/// A parsed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status_code: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl HttpResponse {
    pub fn status(&self) -> Status {
        Status::from(self.status_code)
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// First value of the named header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Every value of the named header, in arrival order
    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Every `Set-Cookie` value
    pub fn set_cookies(&self) -> impl Iterator<Item = &str> {
        self.headers_named("set-cookie")
    }

    /// Redirect target, when the response carries a non-empty Location header
    pub fn location(&self) -> Option<&str> {
        self.header("location").filter(|value| !value.is_empty())
    }

    /// True when the server announced it will close the connection
    pub fn closes_connection(&self) -> bool {
        closes_connection(self.header("connection"))
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// Parses raw response bytes
///
/// A missing blank line means the read stopped early; callers treat that as
/// "need a fresh attempt", not as an empty success.
pub fn parse(raw: &[u8]) -> Result<HttpResponse, ParseError> {
    let boundary = find(raw, HEADER_BOUNDARY).ok_or(ParseError::MissingBoundary)?;
    let head = String::from_utf8_lossy(&raw[..boundary]);
    let (status_code, headers) = parse_head(&head)?;

    let body_bytes = &raw[boundary + HEADER_BOUNDARY.len()..];
    let body = if is_chunked(find_header(&headers, "transfer-encoding")) {
        match decode_chunked(body_bytes) {
            Some(decoded) => String::from_utf8_lossy(&decoded).into_owned(),
            None => String::from_utf8_lossy(body_bytes).into_owned(),
        }
    } else {
        let length = content_length(&headers)
            .map(|length| length.min(body_bytes.len()))
            .unwrap_or(body_bytes.len());
        String::from_utf8_lossy(&body_bytes[..length]).into_owned()
    };

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

/// Returns true once `raw` holds a whole response
///
/// The message is complete when the header block is followed by
/// Content-Length bytes, or by a terminated chunked body. Without either,
/// only 1xx, 204 and 304 end at the header boundary; any other body runs
/// until the peer closes the stream, whatever the Connection header says.
pub fn is_complete(raw: &[u8]) -> bool {
    let Some(boundary) = find(raw, HEADER_BOUNDARY) else {
        return false;
    };
    let head = String::from_utf8_lossy(&raw[..boundary]);
    let Ok((status_code, headers)) = parse_head(&head) else {
        // Let parse() report it
        return true;
    };
    let body = &raw[boundary + HEADER_BOUNDARY.len()..];

    if let Some(length) = content_length(&headers) {
        return body.len() >= length;
    }
    if is_chunked(find_header(&headers, "transfer-encoding")) {
        return decode_chunked(body).is_some();
    }
    (100..200).contains(&status_code) || status_code == 204 || status_code == 304
}

fn parse_head(head: &str) -> Result<(u16, Vec<(String, String)>), ParseError> {
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let status_code = parse_status_line(status_line)
        .ok_or_else(|| ParseError::InvalidStatusLine(status_line.to_string()))?;

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    Ok((status_code, headers))
}

fn parse_status_line(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    parts
        .next()?
        .parse::<u16>()
        .ok()
        .filter(|code| (100..1000).contains(code))
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn content_length(headers: &[(String, String)]) -> Option<usize> {
    find_header(headers, "content-length").and_then(|value| value.parse().ok())
}

fn is_chunked(transfer_encoding: Option<&str>) -> bool {
    transfer_encoding
        .map(|value| value.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false)
}

fn closes_connection(connection: Option<&str>) -> bool {
    connection
        .map(|value| value.eq_ignore_ascii_case("close"))
        .unwrap_or(false)
}

/// Decodes a chunked body; `None` until the terminating chunk has arrived
fn decode_chunked(mut data: &[u8]) -> Option<Vec<u8>> {
    let mut decoded = Vec::new();
    loop {
        let line_end = find(data, b"\r\n")?;
        let size_line = std::str::from_utf8(&data[..line_end]).ok()?;
        let size_hex = size_line.split(';').next()?.trim();
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        data = &data[line_end + 2..];

        if size == 0 {
            // Optional trailers end with an empty line
            let terminated = data.starts_with(b"\r\n") || find(data, HEADER_BOUNDARY).is_some();
            return terminated.then_some(decoded);
        }

        let needed = size.checked_add(2)?;
        if data.len() < needed {
            return None;
        }
        decoded.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
