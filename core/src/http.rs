//! HTTP request and response values.
//!
//! # Design
//! Requests are plain data built by value and handed to `HttpClient` by
//! value, so nothing can change them once they are in flight. Responses
//! expose status and headers as plain fields; the body is a single-use
//! producer (`ResponseBody`) that is consumed by value.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::body::ResponseBody;
use crate::error::{ClientError, ClientResult};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header multimap. Names compare case-insensitively on lookup but
/// keep the spelling they were added with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a header. Earlier values for the same name are kept.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value for `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.first(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Headers {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// An HTTP request described as plain data.
///
/// The URL is not validated here; a malformed URL surfaces as
/// `ClientError::Transport` when the request is executed.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.add(name, value);
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach `value` encoded as JSON. Adds `content-type: application/json`
    /// unless the caller already set a content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> ClientResult<Self> {
        let encoded =
            serde_json::to_vec(value).map_err(|e| ClientError::Serialize(e.to_string()))?;
        if !self.headers.contains("content-type") {
            self.headers.add("content-type", "application/json");
        }
        self.body = Some(Bytes::from(encoded));
        Ok(self)
    }
}

/// Outcome of gating a response before its body is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCheck {
    Passed,
    UnexpectedStatus(u16),
    MissingContentType,
    UnexpectedContentType(String),
}

impl ResponseCheck {
    pub fn passed(&self) -> bool {
        matches!(self, ResponseCheck::Passed)
    }
}

impl fmt::Display for ResponseCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCheck::Passed => write!(f, "ok"),
            ResponseCheck::UnexpectedStatus(status) => write!(f, "Invalid status code: {status}"),
            ResponseCheck::MissingContentType => write!(f, "Missing content type."),
            ResponseCheck::UnexpectedContentType(ct) => write!(f, "Invalid content type: {ct}"),
        }
    }
}

/// An HTTP response whose head has arrived. The body may still be in flight.
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: u16, headers: Headers, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A fully-buffered response, mostly useful for tests.
    pub fn from_bytes(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self::new(status, headers, ResponseBody::from_bytes(body))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.first("content-type")
    }

    /// The announced `content-length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .first("content-length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// Check the status and, when `mime` is given, that a `content-type`
    /// header is present and contains that token.
    pub fn check(&self, expected_status: u16, mime: Option<&str>) -> ResponseCheck {
        if self.status != expected_status {
            return ResponseCheck::UnexpectedStatus(self.status);
        }
        let Some(mime) = mime else {
            return ResponseCheck::Passed;
        };
        match self.content_type() {
            None => ResponseCheck::MissingContentType,
            Some(ct) if ct.to_ascii_lowercase().contains(&mime.to_ascii_lowercase()) => {
                ResponseCheck::Passed
            }
            Some(ct) => ResponseCheck::UnexpectedContentType(ct.to_string()),
        }
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
