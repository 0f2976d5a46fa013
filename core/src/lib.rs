//! Blocking HTTP client wrapper for the most common needs.
//!
//! # Overview
//! `Client` wraps a `ureq` agent with a base path that relative targets are
//! joined onto and a set of headers sent with every request. On top of one
//! request primitive it offers JSON helpers (GET/DELETE/POST/PUT/PATCH), raw
//! byte helpers (GET/DELETE/POST/PUT/HEAD), multipart upload with an optional
//! file, and a websocket upgrade.
//!
//! # Design
//! - Each call returns a `Reply` with the status and headers of its own
//!   response; the client keeps no per-call state and is safe to share.
//! - Statuses of 400 or above become `Error::Status`, which carries a bounded
//!   copy of the response body.
//! - Nothing is retried. Transport, TLS, pooling and websocket framing belong
//!   to `ureq` and `tungstenite`.
//!
//! ```no_run
//! let client = httpcli::Client::builder()
//!     .base_path("http://localhost:8090")
//!     .header("authorization", "Bearer token")
//!     .build()?;
//! let method: String = client.json_get("/a")?.body;
//! # Ok::<(), httpcli::Error>(())
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod multipart;
pub mod shared;
pub mod target;
pub mod ws;

pub use client::{Client, ClientBuilder};
pub use error::{Error, Result, MAX_ERROR_BODY};
pub use http::Reply;
pub use multipart::Form;
pub use shared::{init_shared, shared};
pub use tungstenite::Message;
pub use ureq::http::{HeaderMap, HeaderValue, Method, StatusCode};
pub use ws::{WebSocket, WsResponse};
