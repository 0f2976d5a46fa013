//! Websocket upgrade on top of the client's base path and headers.

use std::net::TcpStream;

use tracing::debug;
use tungstenite::client::IntoClientRequest;
use tungstenite::stream::MaybeTlsStream;

use crate::client::Client;
use crate::error::Result;
use crate::http::append_headers;
use crate::target::websocket_url;

/// Live websocket connection returned by `Client::ws`.
pub type WebSocket = tungstenite::WebSocket<MaybeTlsStream<TcpStream>>;

/// HTTP response of the upgrade handshake.
pub type WsResponse = tungstenite::handshake::client::Response;

impl Client {
    /// Open a websocket to `target`.
    ///
    /// `http`/`https` URLs are switched to `ws`/`wss` and the default headers
    /// are sent with the handshake. The connection is handed over as-is:
    /// ping/pong, close and reconnect are up to the caller.
    pub fn ws(&self, target: &str) -> Result<(WebSocket, WsResponse)> {
        let url = websocket_url(&self.url(target))?;
        let mut request = url.as_str().into_client_request()?;
        append_headers(request.headers_mut(), self.headers());
        debug!(url = %url, "websocket handshake");
        let (socket, response) = tungstenite::connect(request)?;
        Ok((socket, response))
    }
}
