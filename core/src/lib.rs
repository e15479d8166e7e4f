//! Blocking HTTP client core used by the fetch examples.
//!
//! # Overview
//! Builds `HttpRequest` values, executes them through an explicitly owned
//! `HttpClient`, and consumes the resulting `HttpResponse` in one of three
//! ways: buffered under a cap, accumulated from a lazy chunk sequence, or
//! streamed to a file with progress callbacks.
//!
//! # Design
//! - The transport (pooling, TLS, chunked decoding) is `ureq`'s business;
//!   this crate only shapes requests and consumes responses.
//! - Response status and headers are plain data; the body is consumed by
//!   value, so it can be read at most once.
//! - Status and content-type mismatches are reported by `ResponseCheck`,
//!   not as errors.
//! - Payload types are defined independently from the mock-server crate;
//!   integration tests catch drift.

pub mod body;
pub mod client;
pub mod download;
pub mod error;
pub mod http;
pub mod types;

pub use body::{accumulate, BodyChunks, ResponseBody};
pub use client::{ClientConfig, HttpClient};
pub use download::{DownloadProgress, DownloadResult, FileDownload};
pub use error::{ClientError, ClientResult};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, ResponseCheck};
pub use types::{decode_json, Echo, Todo};
