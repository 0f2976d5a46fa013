use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartError,
        ws::{Message, WebSocket, WebSocketUpgrade},
        Multipart, Path,
    },
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing::debug;

/// Header every echo route sets to the inbound request method.
pub const METHOD_HEADER: &str = "X-SOME";

/// Text frame sent on `/c` right after the upgrade.
pub const WS_GREETING: &str = "OK";

pub fn app() -> Router {
    Router::new()
        .route("/a", any(echo_method))
        .route("/b", post(echo_upload))
        .route("/c", get(greet_socket))
        .route("/echo", any(echo_body))
        .route("/headers", any(echo_headers))
        .route("/status/{code}", any(respond_with_status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo_method(method: Method) -> impl IntoResponse {
    ([(METHOD_HEADER, method.to_string())], Json(method.to_string()))
}

/// Answer with the content of the `file` part as a JSON string.
async fn echo_upload(
    method: Method,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some("file") {
            let content = field.text().await.map_err(bad_multipart)?;
            return Ok(([(METHOD_HEADER, method.to_string())], Json(content)));
        }
    }
    Err((StatusCode::BAD_REQUEST, "missing file part".to_string()))
}

fn bad_multipart(err: MultipartError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

async fn greet_socket(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(send_greeting)
}

async fn send_greeting(mut socket: WebSocket) {
    if let Err(err) = socket.send(Message::Text(WS_GREETING.into())).await {
        debug!(%err, "websocket client went away");
        return;
    }
    let _ = socket.send(Message::Close(None)).await;
}

async fn echo_body(body: Bytes) -> Bytes {
    body
}

/// Request headers as `name -> [values]`, in arrival order per name.
async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, Vec<String>>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        out.entry(name.to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    Json(out)
}

async fn respond_with_status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}
