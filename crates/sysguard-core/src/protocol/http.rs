//! Minimal HTTP/1.1 request parsing and response heads.
//!
//! Parsing rules:
//! - One read, one request, one response, then close. No bodies, no keep-alive.
//! - Routing is prefix based on the raw request line, not a full HTTP grammar.
//! - Never `unwrap()` / `expect()` / `panic!()`; hostile bytes become errors or 400s.

use std::fmt::Write;
use std::path::Path;

use crate::error::{Result, SysGuardError};

/// Default size of the single request read.
pub const DEFAULT_REQUEST_BUFFER: usize = 8192;

/// Fixed body of every 404 response.
pub const NOT_FOUND_BODY: &str = "Not Found";

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// One parsed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// First line verbatim (without CRLF). Routing prefixes are matched against it.
    pub request_line: String,
    /// Method token, e.g. `GET`.
    pub method: String,
    /// Raw request target, query included.
    pub target: String,
    /// Target with query and fragment stripped.
    pub path: String,
    /// `Upgrade: websocket` was present (case-insensitive).
    pub upgrade_websocket: bool,
    /// `Sec-WebSocket-Key` value, if sent.
    pub websocket_key: Option<String>,
}

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// WebSocket upgrade; wins over every method/path rule.
    Upgrade,
    /// `GET /health`: one-shot JSON metrics.
    Health,
    /// `GET /` with an empty path: the index document.
    Index,
    /// Any other `GET /...`: a file relative to the web root.
    Asset(String),
    /// Everything else: `400 Bad Request`, empty body.
    BadRequest,
}

impl Route {
    /// Short label for logs and counters.
    pub fn label(&self) -> &'static str {
        match self {
            Route::Upgrade => "upgrade",
            Route::Health => "health",
            Route::Index => "index",
            Route::Asset(_) => "asset",
            Route::BadRequest => "bad_request",
        }
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse the bytes produced by a single read of at most `capacity` bytes.
///
/// Errors:
/// - empty input: the peer closed without sending anything;
/// - a full buffer without the blank line ending the head: headers too large.
pub fn parse_request(buf: &[u8], capacity: usize) -> Result<ParsedRequest> {
    if buf.is_empty() {
        return Err(SysGuardError::ConnectionClosed);
    }
    let head_end = find_subslice(buf, HEADER_TERMINATOR);
    if head_end.is_none() && buf.len() >= capacity {
        return Err(SysGuardError::RequestTooLarge(capacity));
    }

    let head = buf.get(..head_end.unwrap_or(buf.len())).unwrap_or(buf);
    let head = String::from_utf8_lossy(head);
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or_default().to_string();
    let mut parts = request_line.split(' ');
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();
    let path = target
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_string();

    let mut upgrade_websocket = false;
    let mut websocket_key = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else { continue; };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("upgrade") && value.eq_ignore_ascii_case("websocket") {
            upgrade_websocket = true;
        } else if name.eq_ignore_ascii_case("sec-websocket-key") && !value.is_empty() {
            websocket_key = Some(value.to_string());
        }
    }

    Ok(ParsedRequest {
        request_line,
        method,
        target,
        path,
        upgrade_websocket,
        websocket_key,
    })
}

/// Classify a parsed request.
pub fn classify(req: &ParsedRequest) -> Route {
    if req.upgrade_websocket {
        return Route::Upgrade;
    }
    let line = req.request_line.as_str();
    if line.starts_with("GET /health") {
        Route::Health
    } else if line.starts_with("GET /dashboard.js") {
        Route::Asset("dashboard.js".to_string())
    } else if line.starts_with("GET /") {
        let rel = req.path.trim_start_matches('/');
        if rel.is_empty() {
            Route::Index
        } else {
            Route::Asset(rel.to_string())
        }
    } else {
        Route::BadRequest
    }
}

/// Guess a content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        _ => "text/plain",
    }
}

/// Status codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    SwitchingProtocols,
    Ok,
    BadRequest,
    NotFound,
    InternalServerError,
    ServiceUnavailable,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        match self {
            StatusCode::SwitchingProtocols => 101,
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::ServiceUnavailable => 503,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            StatusCode::SwitchingProtocols => "Switching Protocols",
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// Status line plus headers, encoded once and written before any body.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    status: StatusCode,
    headers: Vec<(&'static str, String)>,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn content_length(self, len: u64) -> Self {
        self.header("Content-Length", len.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Encode as `HTTP/1.1 <code> <reason>\r\n<headers>\r\n`.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(128);
        let _ = write!(
            out,
            "HTTP/1.1 {} {}\r\n",
            self.status.as_u16(),
            self.status.reason()
        );
        for (name, value) in &self.headers {
            let _ = write!(out, "{name}: {value}\r\n");
        }
        out.push_str("\r\n");
        out
    }
}

/// Complete response with a small in-memory body.
pub fn full_response(head: ResponseHead, body: &[u8]) -> Vec<u8> {
    let head = head.content_length(body.len() as u64).encode();
    let mut out = Vec::with_capacity(head.len() + body.len());
    out.extend_from_slice(head.as_bytes());
    out.extend_from_slice(body);
    out
}

/// `404 Not Found` with the fixed 9-byte body.
pub fn not_found() -> Vec<u8> {
    full_response(
        ResponseHead::new(StatusCode::NotFound).header("Connection", "close"),
        NOT_FOUND_BODY.as_bytes(),
    )
}

/// `400 Bad Request` with an empty body.
pub fn bad_request() -> Vec<u8> {
    full_response(
        ResponseHead::new(StatusCode::BadRequest).header("Connection", "close"),
        b"",
    )
}

/// `503 Service Unavailable` with an empty body.
pub fn service_unavailable() -> Vec<u8> {
    full_response(
        ResponseHead::new(StatusCode::ServiceUnavailable).header("Connection", "close"),
        b"",
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ParsedRequest {
        parse_request(s.as_bytes(), DEFAULT_REQUEST_BUFFER).unwrap()
    }

    #[test]
    fn empty_read_is_connection_closed() {
        let err = parse_request(b"", DEFAULT_REQUEST_BUFFER).unwrap_err();
        assert!(matches!(err, SysGuardError::ConnectionClosed));
    }

    #[test]
    fn full_buffer_without_terminator_is_too_large() {
        let buf = vec![b'a'; 64];
        let err = parse_request(&buf, 64).unwrap_err();
        assert!(matches!(err, SysGuardError::RequestTooLarge(64)));
    }

    #[test]
    fn partial_head_below_capacity_still_parses() {
        let req = parse("GET /health HTTP/1.1\r\nHost: x");
        assert_eq!(classify(&req), Route::Health);
    }

    #[test]
    fn query_is_stripped_from_path() {
        let req = parse("GET /missing.file?x=1&y=2 HTTP/1.1\r\n\r\n");
        assert_eq!(req.target, "/missing.file?x=1&y=2");
        assert_eq!(req.path, "/missing.file");
        assert_eq!(classify(&req), Route::Asset("missing.file".into()));
    }

    #[test]
    fn upgrade_header_wins_over_method() {
        let req = parse("POST /anything HTTP/1.1\r\nupgrade:  WebSocket \r\nSec-WebSocket-Key: abc\r\n\r\n");
        assert!(req.upgrade_websocket);
        assert_eq!(req.websocket_key.as_deref(), Some("abc"));
        assert_eq!(classify(&req), Route::Upgrade);
    }

    #[test]
    fn health_is_a_prefix_match() {
        assert_eq!(classify(&parse("GET /healthz HTTP/1.1\r\n\r\n")), Route::Health);
    }

    #[test]
    fn root_maps_to_index() {
        assert_eq!(classify(&parse("GET / HTTP/1.1\r\n\r\n")), Route::Index);
        assert_eq!(classify(&parse("GET /?v=2 HTTP/1.1\r\n\r\n")), Route::Index);
    }

    #[test]
    fn other_methods_are_bad_requests() {
        assert_eq!(classify(&parse("POST / HTTP/1.1\r\n\r\n")), Route::BadRequest);
        assert_eq!(classify(&parse("garbage\r\n\r\n")), Route::BadRequest);
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("index.html")), "text/html");
        assert_eq!(content_type_for(Path::new("dashboard.js")), "application/javascript");
        assert_eq!(content_type_for(Path::new("a/b.CSS")), "text/css");
        assert_eq!(content_type_for(Path::new("m.json")), "application/json");
        assert_eq!(content_type_for(Path::new("README")), "text/plain");
        assert_eq!(content_type_for(Path::new("x.html.bak")), "text/plain");
    }

    #[test]
    fn canned_responses() {
        let nf = String::from_utf8(not_found()).unwrap();
        assert!(nf.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(nf.contains("Content-Length: 9\r\n"));
        assert!(nf.ends_with("\r\n\r\nNot Found"));

        let br = String::from_utf8(bad_request()).unwrap();
        assert!(br.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(br.ends_with("Content-Length: 0\r\n\r\n"));
    }
}
