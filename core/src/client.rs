//! Client handle that executes `HttpRequest` values over the network.
//!
//! # Design
//! `HttpClient` owns a `ureq::Agent` (and through it the connection pool).
//! The agent lives behind a `RwLock<Option<_>>`: `shutdown` takes it out,
//! after which every operation fails with `ClientError::Shutdown` instead of
//! silently reconnecting. There is no process-wide instance; the caller
//! creates one handle, passes `&HttpClient` to whoever needs it, and shuts
//! it down on every exit path.

use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};

use crate::body::ResponseBody;
use crate::download::{DownloadProgress, DownloadResult, FileDownload};
use crate::error::{ClientError, ClientResult};
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};

/// Transport settings applied to every request made through a handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connect timeout in milliseconds; `None` leaves it to the transport.
    pub connect_timeout_ms: Option<u64>,
    pub max_redirects: u32,
    pub max_idle_connections: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: Some(10_000),
            max_redirects: 10,
            max_idle_connections: 10,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON object; absent fields keep their defaults.
    pub fn from_json(raw: &str) -> ClientResult<Self> {
        serde_json::from_str(raw).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn build_agent(&self) -> Agent {
        Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(self.connect_timeout_ms.map(Duration::from_millis))
            .max_redirects(self.max_redirects)
            .max_idle_connections(self.max_idle_connections)
            .build()
            .new_agent()
    }
}

/// Explicitly owned client handle.
pub struct HttpClient {
    agent: RwLock<Option<Agent>>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        debug!(?config, "creating http client");
        Self {
            agent: RwLock::new(Some(config.build_agent())),
        }
    }

    /// Send `request` and wait for the response head, at most `timeout`.
    ///
    /// The body is returned unread; drain it with one of the
    /// `ResponseBody` consumers.
    pub fn execute(&self, request: HttpRequest, timeout: Duration) -> ClientResult<HttpResponse> {
        self.send(request, Some(timeout))
    }

    /// Run `request` to completion, streaming the body into `target`.
    ///
    /// `on_progress` is called synchronously after every chunk written.
    pub fn download<F>(
        &self,
        request: HttpRequest,
        target: FileDownload,
        on_progress: F,
    ) -> ClientResult<DownloadResult>
    where
        F: FnMut(&DownloadProgress),
    {
        debug!(url = %request.url, path = %target.path().display(), "starting download");
        let response = self.send(request, None)?;
        target.write_response(response, on_progress)
    }

    /// Release the agent and its pooled connections. A second call fails
    /// with `ClientError::Shutdown`.
    pub fn shutdown(&self) -> ClientResult<()> {
        let mut slot = self.agent.write().unwrap_or_else(PoisonError::into_inner);
        match slot.take() {
            Some(agent) => {
                drop(agent);
                debug!("http client shut down");
                Ok(())
            }
            None => Err(ClientError::Shutdown),
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.agent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn agent(&self) -> ClientResult<Agent> {
        self.agent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ClientError::Shutdown)
    }

    fn send(&self, request: HttpRequest, timeout: Option<Duration>) -> ClientResult<HttpResponse> {
        let agent = self.agent()?;
        debug!(method = %request.method, url = %request.url, ?timeout, "executing request");

        let url = request.url.as_str();
        let body = request.body.as_ref();
        let result = match request.method {
            HttpMethod::Get => prepare(agent.get(url), &request, timeout).call(),
            HttpMethod::Head => prepare(agent.head(url), &request, timeout).call(),
            HttpMethod::Delete => prepare(agent.delete(url), &request, timeout).call(),
            HttpMethod::Post => send_body(prepare(agent.post(url), &request, timeout), body),
            HttpMethod::Put => send_body(prepare(agent.put(url), &request, timeout), body),
            HttpMethod::Patch => send_body(prepare(agent.patch(url), &request, timeout), body),
        };
        let response = result.map_err(ClientError::from_ureq)?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.add(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        debug!(status, headers = headers.len(), "received response head");

        let body = ResponseBody::from_reader(response.into_body().into_reader());
        Ok(HttpResponse::new(status, headers, body))
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        let open = self
            .agent
            .get_mut()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        if open {
            warn!("http client dropped without shutdown");
        }
    }
}

/// Copy headers and the per-call deadline onto a transport request.
fn prepare<B>(
    mut builder: RequestBuilder<B>,
    request: &HttpRequest,
    timeout: Option<Duration>,
) -> RequestBuilder<B> {
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }
    match timeout {
        Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
        None => builder,
    }
}

fn send_body(
    builder: RequestBuilder<WithBody>,
    body: Option<&Bytes>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(&bytes[..]),
        None => builder.send_empty(),
    }
}
