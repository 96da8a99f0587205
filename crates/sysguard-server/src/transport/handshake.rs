//! Upgrade handshake (pre-upgrade guard).
//!
//! Purpose:
//! - Derive `Sec-WebSocket-Accept` from the client key (RFC 6455 4.2.2).
//! - Refuse upgrades without a key (400).
//! - Refuse upgrades once the push pool is full (503), before any push loop
//!   is spawned.

use sysguard_core::protocol::http::{self, ParsedRequest};
use sysguard_core::protocol::ws::switching_protocols;

/// Outcome of an upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// Encoded `101 Switching Protocols` head.
    Accept(String),
    /// Full HTTP response to send before closing.
    Reject { reason: &'static str, response: Vec<u8> },
}

/// Decide whether `req` may become a push session.
pub fn negotiate(req: &ParsedRequest, has_capacity: bool) -> Handshake {
    let Some(key) = req.websocket_key.as_deref() else {
        return Handshake::Reject {
            reason: "missing_key",
            response: http::bad_request(),
        };
    };
    if !has_capacity {
        return Handshake::Reject {
            reason: "capacity",
            response: http::service_unavailable(),
        };
    }
    Handshake::Accept(switching_protocols(key).encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysguard_core::protocol::http::{parse_request, DEFAULT_REQUEST_BUFFER};

    fn upgrade_req(key: Option<&str>) -> ParsedRequest {
        let mut raw = String::from("GET / HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n");
        if let Some(k) = key {
            raw.push_str(&format!("Sec-WebSocket-Key: {k}\r\n"));
        }
        raw.push_str("\r\n");
        parse_request(raw.as_bytes(), DEFAULT_REQUEST_BUFFER).unwrap()
    }

    #[test]
    fn accepts_with_derived_key() {
        match negotiate(&upgrade_req(Some("dGhlIHNhbXBsZSBub25jZQ==")), true) {
            Handshake::Accept(head) => {
                assert!(head.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
                assert!(head.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
            }
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[test]
    fn missing_key_is_bad_request() {
        let h = negotiate(&upgrade_req(None), true);
        let Handshake::Reject { reason, response } = h else { panic!("expected reject") };
        assert_eq!(reason, "missing_key");
        assert!(response.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
    }

    #[test]
    fn full_pool_is_service_unavailable() {
        let h = negotiate(&upgrade_req(Some("abc")), false);
        let Handshake::Reject { reason, response } = h else { panic!("expected reject") };
        assert_eq!(reason, "capacity");
        assert!(response.starts_with(b"HTTP/1.1 503 Service Unavailable\r\n"));
    }
}
