//! Request parsing and routing vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sysguard_core::protocol::http::{classify, parse_request, Route, DEFAULT_REQUEST_BUFFER};

mod vector_loader;
use vector_loader::RequestVector;

fn route_name(route: &Route) -> String {
    match route {
        Route::Asset(p) => format!("asset:{p}"),
        other => other.label().to_string(),
    }
}

#[test]
fn request_vectors() {
    let vectors: Vec<RequestVector> = vector_loader::load("requests.json");

    for v in vectors {
        let raw = v.request.decode();
        let res = parse_request(&raw, DEFAULT_REQUEST_BUFFER);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.class().as_str(), err.class, "vector={}", v.description);
            continue;
        }

        let req = res.expect("expected parsed request");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(route_name(&classify(&req)), ex["route"].as_str().unwrap(), "vector={}", v.description);
        if let Some(path) = ex.get("path") {
            assert_eq!(req.path, path.as_str().unwrap(), "vector={}", v.description);
        }
        if let Some(key) = ex.get("websocket_key") {
            assert_eq!(req.websocket_key.as_deref(), key.as_str(), "vector={}", v.description);
        }
    }
}

#[test]
fn oversized_head_is_rejected() {
    let mut raw = b"GET / HTTP/1.1\r\nX-Pad: ".to_vec();
    raw.resize(DEFAULT_REQUEST_BUFFER, b'a');
    let err = parse_request(&raw, DEFAULT_REQUEST_BUFFER).unwrap_err();
    assert_eq!(err.class().as_str(), "REQUEST");
}
