use std::{collections::BTreeMap, convert::Infallible, time::Duration};

use axum::{
    body::Body,
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use bytes::Bytes;
use futures_util::stream;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::debug;

/// Largest body `/bytes` and `/stream-bytes` will produce.
pub const MAX_BYTES: usize = 10 * 1024 * 1024;
/// Largest side accepted by the placeholder image route.
pub const MAX_IMAGE_SIDE: u32 = 4000;
/// Longest delay `/delay` will honour, in seconds.
pub const MAX_DELAY_SECS: u64 = 10;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Body returned by `POST /post`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EchoResponse {
    pub args: BTreeMap<String, String>,
    pub data: String,
    pub headers: BTreeMap<String, String>,
    pub json: Option<serde_json::Value>,
    pub url: String,
}

#[derive(Deserialize)]
pub struct StreamParams {
    pub chunk_size: Option<usize>,
}

pub fn app() -> Router {
    Router::new()
        .route("/post", post(echo))
        .route("/echo/plain", post(echo_plain))
        .route("/status/{code}", any(status))
        .route("/bytes/{n}", get(fixed_bytes))
        .route("/stream-bytes/{n}", get(stream_bytes))
        .route("/delay/{secs}", any(delay))
        .route("/{file}", get(image))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Deterministic payload used by the byte routes.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Parse `"600x400.png"` into `(600, 400)`.
pub fn parse_image_size(file: &str) -> Option<(u32, u32)> {
    let (w, h) = file.strip_suffix(".png")?.split_once('x')?;
    let (w, h) = (w.parse::<u32>().ok()?, h.parse::<u32>().ok()?);
    let valid = |side: u32| (1..=MAX_IMAGE_SIDE).contains(&side);
    (valid(w) && valid(h)).then_some((w, h))
}

/// PNG signature followed by filler sized from the dimensions. Not a
/// decodable image; only the byte count and content type matter here.
pub fn placeholder_png(width: u32, height: u32) -> Vec<u8> {
    let filler = (width as usize * height as usize) / 64;
    let mut out = Vec::with_capacity(PNG_SIGNATURE.len() + filler);
    out.extend_from_slice(&PNG_SIGNATURE);
    out.extend((0..filler).map(|i| (i % 256) as u8));
    out
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

async fn echo(
    uri: Uri,
    Query(args): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<EchoResponse> {
    debug!(len = body.len(), "echoing post body");
    Json(EchoResponse {
        args,
        data: String::from_utf8_lossy(&body).into_owned(),
        headers: flatten_headers(&headers),
        json: serde_json::from_slice(&body).ok(),
        url: uri.to_string(),
    })
}

async fn echo_plain(body: Bytes) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn fixed_bytes(Path(n): Path<usize>) -> Response {
    if n > MAX_BYTES {
        return StatusCode::BAD_REQUEST.into_response();
    }
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        pattern(n),
    )
        .into_response()
}

async fn stream_bytes(Path(n): Path<usize>, Query(params): Query<StreamParams>) -> Response {
    if n > MAX_BYTES {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let chunk_size = params.chunk_size.unwrap_or(10 * 1024).max(1);
    let data = Bytes::from(pattern(n));
    let chunks: Vec<Result<Bytes, Infallible>> = (0..n)
        .step_by(chunk_size)
        .map(|start| Ok(data.slice(start..(start + chunk_size).min(n))))
        .collect();
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(stream::iter(chunks)),
    )
        .into_response()
}

async fn delay(Path(secs): Path<u64>) -> Json<serde_json::Value> {
    let secs = secs.min(MAX_DELAY_SECS);
    tokio::time::sleep(Duration::from_secs(secs)).await;
    Json(serde_json::json!({ "delayed": secs }))
}

async fn image(Path(file): Path<String>) -> Response {
    match parse_image_size(&file) {
        Some((w, h)) => (
            [(header::CONTENT_TYPE, "image/png")],
            placeholder_png(w, h),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
