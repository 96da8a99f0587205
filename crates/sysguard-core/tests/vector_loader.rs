//! JSON test vector loader shared by frame/request tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FrameVector {
    pub description: String,
    pub payload_len: usize,
    pub header: EncodedBytes,
}

#[derive(Debug, Deserialize)]
pub struct RequestVector {
    pub description: String,
    pub request: EncodedBytes,
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub class: String,
}

#[derive(Debug, Deserialize)]
pub struct EncodedBytes {
    pub encoding: String,
    pub data: String,
}

impl EncodedBytes {
    pub fn decode(&self) -> Vec<u8> {
        match self.encoding.as_str() {
            "hex" => hex::decode(&self.data).expect("invalid hex in test vector"),
            "text" => self.data.clone().into_bytes(),
            other => panic!("unsupported encoding: {other}"),
        }
    }
}

pub fn load<T: serde::de::DeserializeOwned>(name: &str) -> T {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
