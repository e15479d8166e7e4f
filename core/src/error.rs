//! Error types for the fetch client.
//!
//! # Design
//! Transport-level failures (`Transport`, `Timeout`) are kept apart from
//! body-consumption failures (`PayloadTooLarge`, `Decode`) and local I/O
//! (`Filesystem`). Status-code and content-type mismatches are not errors at
//! all; see `ResponseCheck`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout `fetch-core`.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by `HttpClient` and the response consumers.
#[derive(Debug, Error)]
pub enum ClientError {
    /// DNS, connect, reset, malformed URL, or an interrupted transfer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The deadline passed before the exchange completed.
    #[error("request timed out")]
    Timeout,

    /// A buffered body grew past its cap.
    #[error("response body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    /// The body did not match the expected JSON shape.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// The download target could not be opened or written.
    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The client handle was used after `shutdown`.
    #[error("client has been shut down")]
    Shutdown,
}

impl ClientError {
    /// Classify an error raised by the transport.
    pub(crate) fn from_ureq(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => ClientError::Timeout,
            ureq::Error::Io(e) => ClientError::from_io(e),
            other => ClientError::Transport(other.to_string()),
        }
    }

    /// Classify an error raised while reading a response body. The body
    /// reader wraps transport errors, deadline expiry included, in
    /// `io::Error`, so look inside before falling back to the kind.
    pub(crate) fn from_io(err: io::Error) -> Self {
        let inner = err.get_ref().and_then(|e| e.downcast_ref::<ureq::Error>());
        if let Some(ureq::Error::Timeout(_)) = inner {
            return ClientError::Timeout;
        }
        match err.kind() {
            io::ErrorKind::TimedOut => ClientError::Timeout,
            _ => ClientError::Transport(err.to_string()),
        }
    }
}
