//! JSON payloads exchanged with the echo endpoint.
//!
//! # Design
//! These mirror the mock-server's echo contract but are defined
//! independently; integration tests catch drift between the two crates.
//! `Todo` is strict (every field required, nothing extra) so a shape
//! mismatch fails at decode time instead of producing a half-filled value.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Payload posted by the JSON example.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

/// Echo-server envelope; only the parsed `json` field is kept.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Echo<T> {
    pub json: T,
}

/// Decode `bytes` as `T`, mapping any mismatch to `ClientError::Decode`.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(bytes).map_err(|e| ClientError::Decode(e.to_string()))
}
