//! The three fetch examples, run in order against injected endpoints.
//!
//! # Overview
//! 1. `post_raw`: plain POST, inspect headers, buffer the body under a cap.
//! 2. `post_json`: typed JSON round trip through an echo endpoint, body
//!    accumulated from chunks.
//! 3. `download_image`: stream a file to disk with progress output.
//!
//! # Failure policy
//! Every flow returns `ClientResult`; `run_all` stops at the first error and
//! hands it to the caller, which treats it as fatal. Status and
//! content-type mismatches are not errors: the flow prints why and returns
//! `Flow::Aborted`, and the run carries on with the next example.

use std::path::PathBuf;
use std::time::Duration;

use fetch_core::{
    accumulate, decode_json, ClientResult, DownloadResult, Echo, FileDownload, HttpClient,
    HttpRequest, ResponseCheck, Todo,
};
use tracing::{info, warn};

/// Deadline for the non-streaming requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Cap for the buffered body in `post_raw`.
pub const BODY_LIMIT: usize = 1024 * 1024;
pub const USER_AGENT: &str = "fetch-runner";
pub const IMAGE_NAME: &str = "600x400.png";

/// Where the examples send their requests.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub echo_url: String,
    pub image_url: String,
    pub download_path: PathBuf,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            echo_url: "https://httpbin.org/post".to_string(),
            image_url: format!("https://placehold.co/{IMAGE_NAME}"),
            download_path: std::env::temp_dir().join(IMAGE_NAME),
        }
    }
}

impl Endpoints {
    /// Endpoints on a server exposing `/post` and `/{W}x{H}.png`.
    pub fn at(base_url: &str, download_dir: impl Into<PathBuf>) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            echo_url: format!("{base}/post"),
            image_url: format!("{base}/{IMAGE_NAME}"),
            download_path: download_dir.into().join(IMAGE_NAME),
        }
    }
}

/// How a gated example ended.
#[derive(Debug)]
pub enum Flow<T> {
    Done(T),
    Aborted(ResponseCheck),
}

impl<T> Flow<T> {
    pub fn done(self) -> Option<T> {
        match self {
            Flow::Done(value) => Some(value),
            Flow::Aborted(_) => None,
        }
    }
}

/// What `post_raw` observed.
#[derive(Debug, Clone)]
pub struct PostReport {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: String,
}

#[derive(Debug)]
pub struct Summary {
    pub post: Flow<PostReport>,
    pub json: Flow<Todo>,
    pub download: DownloadResult,
}

/// The value posted by `post_json`.
pub fn sample_todo() -> Todo {
    Todo {
        id: 1,
        title: "foo".to_string(),
        completed: false,
    }
}

fn abort<T>(example: &str, check: ResponseCheck) -> ClientResult<Flow<T>> {
    println!("{check}");
    warn!(example, %check, "response rejected");
    Ok(Flow::Aborted(check))
}

/// Example 1: POST raw bytes, print the interesting headers, then the body.
pub fn post_raw(client: &HttpClient, endpoints: &Endpoints) -> ClientResult<Flow<PostReport>> {
    let request = HttpRequest::post(&endpoints.echo_url)
        .header("User-Agent", USER_AGENT)
        .body("Some data");
    let response = client.execute(request, REQUEST_TIMEOUT)?;

    let check = response.check(200, None);
    if !check.passed() {
        return abort("post_raw", check);
    }

    let content_type = response.content_type().map(str::to_string);
    println!("{}", content_type.as_deref().unwrap_or_default());
    let content_length = response.content_length();
    println!("{}", content_length.map_or(-1, |n| n as i64));

    let status = response.status;
    let body = response.body.collect(BODY_LIMIT)?;
    let body = String::from_utf8_lossy(&body).into_owned();
    println!("{body}");

    Ok(Flow::Done(PostReport {
        status,
        content_type,
        content_length,
        body,
    }))
}

/// Example 2: POST a `Todo` as JSON and decode it back out of the echo.
pub fn post_json(client: &HttpClient, endpoints: &Endpoints) -> ClientResult<Flow<Todo>> {
    let request = HttpRequest::post(&endpoints.echo_url).json(&sample_todo())?;
    let response = client.execute(request, REQUEST_TIMEOUT)?;

    let check = response.check(200, Some("application/json"));
    if !check.passed() {
        return abort("post_json", check);
    }

    let bytes = accumulate(response.body.chunks())?;
    let echo: Echo<Todo> = decode_json(&bytes)?;
    println!("{}", echo.json.title);
    Ok(Flow::Done(echo.json))
}

/// Example 3: stream the placeholder image to disk, reporting progress.
pub fn download_image(client: &HttpClient, endpoints: &Endpoints) -> ClientResult<DownloadResult> {
    let target = FileDownload::create(&endpoints.download_path)?;
    let result = client.download(HttpRequest::get(&endpoints.image_url), target, |progress| {
        if let Some(total) = progress.total_bytes {
            println!("Total: {total}.");
        }
        println!("Downloaded: {}.", progress.received_bytes);
    })?;
    println!("{result}");
    Ok(result)
}

/// Run the three examples strictly in order; the first error ends the run.
pub fn run_all(client: &HttpClient, endpoints: &Endpoints) -> ClientResult<Summary> {
    info!(url = %endpoints.echo_url, "example 1: raw post");
    let post = post_raw(client, endpoints)?;

    info!(url = %endpoints.echo_url, "example 2: json round trip");
    let json = post_json(client, endpoints)?;

    info!(url = %endpoints.image_url, path = %endpoints.download_path.display(), "example 3: download");
    let download = download_image(client, endpoints)?;

    Ok(Summary {
        post,
        json,
        download,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_point_at_public_services() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.echo_url, "https://httpbin.org/post");
        assert_eq!(endpoints.image_url, "https://placehold.co/600x400.png");
        assert!(endpoints.download_path.ends_with(IMAGE_NAME));
    }

    #[test]
    fn local_endpoints_strip_trailing_slash() {
        let endpoints = Endpoints::at("http://127.0.0.1:3000/", "/tmp/x");
        assert_eq!(endpoints.echo_url, "http://127.0.0.1:3000/post");
        assert_eq!(endpoints.image_url, "http://127.0.0.1:3000/600x400.png");
        assert_eq!(endpoints.download_path, PathBuf::from("/tmp/x/600x400.png"));
    }

    #[test]
    fn aborted_flow_has_no_value() {
        let flow: Flow<u8> = Flow::Aborted(ResponseCheck::UnexpectedStatus(404));
        assert!(flow.done().is_none());
        assert_eq!(Flow::Done(3u8).done(), Some(3));
    }
}
