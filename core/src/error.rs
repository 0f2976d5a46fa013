//! Error types for the HTTP client wrapper.
//!
//! # Design
//! Every failure is returned to the caller unchanged and never retried.
//! Transport errors from `ureq` and handshake errors from `tungstenite` are
//! wrapped as-is. Responses with a status code of 400 or above land in
//! `Status`, which keeps (a bounded prefix of) the response body so server-side
//! error payloads stay diagnosable.

use std::path::PathBuf;

use thiserror::Error;

/// Upper bound on how much of an error response body is kept in `Error::Status`.
pub const MAX_ERROR_BODY: u64 = 64 * 1024;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by `Client` methods.
#[derive(Debug, Error)]
pub enum Error {
    /// The resolved request target is not a valid URI.
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: ureq::http::uri::InvalidUri,
    },

    /// A default header name or value could not be parsed.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The request could not be assembled from its parts.
    #[error("request construction failed: {0}")]
    Request(#[from] ureq::http::Error),

    /// The URL scheme has no websocket equivalent.
    #[error("unsupported scheme for websocket: {0}")]
    UnsupportedScheme(String),

    /// DNS, connection, TLS or body I/O failure from the transport.
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// The server answered with a status code of 400 or above.
    #[error("HTTP {status} {reason}: {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The multipart source file could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The websocket handshake failed.
    #[error("websocket handshake failed: {0}")]
    WebSocket(#[from] Box<tungstenite::Error>),
}

impl Error {
    /// The HTTP status code, if this is a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<tungstenite::Error> for Error {
    fn from(err: tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}
