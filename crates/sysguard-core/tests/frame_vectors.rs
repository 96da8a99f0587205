//! WebSocket frame header vectors at every length-encoding boundary.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sysguard_core::protocol::ws::{decode_header, encode_text_frame, header_len};

mod vector_loader;
use vector_loader::FrameVector;

#[test]
fn frame_header_vectors() {
    let vectors: Vec<FrameVector> = vector_loader::load("frame_headers.json");
    assert!(!vectors.is_empty());

    for v in vectors {
        let payload = vec![b'{'; v.payload_len];
        let frame = encode_text_frame(&payload);
        let expected = v.header.decode();

        assert_eq!(header_len(v.payload_len), expected.len(), "vector={}", v.description);
        assert_eq!(&frame[..expected.len()], expected.as_slice(), "vector={}", v.description);
        assert_eq!(&frame[expected.len()..], payload.as_slice(), "vector={}", v.description);

        let h = decode_header(&frame).expect("header must decode");
        assert_eq!(h.payload_len, v.payload_len as u64, "vector={}", v.description);
        assert_eq!(h.header_len, expected.len(), "vector={}", v.description);
    }
}

#[test]
fn json_payload_is_carried_verbatim() {
    let json = br#"{"cpu":{"usage_percent":12.5},"memory":{"percent":40.0}}"#;
    let frame = encode_text_frame(json);
    assert_eq!(frame[0], 0x81);
    assert_eq!(frame[1] as usize, json.len());
    assert_eq!(&frame[2..], json);
}
