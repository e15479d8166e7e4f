//! Exercises `HttpClient` over real HTTP against the mock server.
//!
//! # Design
//! Each test starts the mock server on a random port in a background thread
//! (current-thread tokio runtime) and talks to it through the blocking
//! client, so every consumer is driven by the real transport.

use std::io::{Read, Write};
use std::time::Duration;

use fetch_core::{
    accumulate, decode_json, ClientConfig, ClientError, Echo, FileDownload, HttpClient,
    HttpRequest, ResponseCheck, Todo,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Start the mock server and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client() -> HttpClient {
    HttpClient::new(ClientConfig::default())
}

#[test]
fn post_echo_round_trip() {
    let base = start_server();
    let client = client();

    let req = HttpRequest::post(format!("{base}/post"))
        .header("User-Agent", "X")
        .body("Some data");
    let resp = client.execute(req, TIMEOUT).unwrap();

    assert_eq!(resp.status, 200);
    assert!(!resp.content_type().unwrap_or_default().is_empty());
    assert!(resp.content_length().is_some());

    let body = resp.body.collect(1024 * 1024).unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("Some data"), "body: {text}");

    client.shutdown().unwrap();
}

#[test]
fn json_round_trip_through_echo() {
    let base = start_server();
    let client = client();

    let input = Todo {
        id: 1,
        title: "foo".to_string(),
        completed: false,
    };
    let req = HttpRequest::post(format!("{base}/post")).json(&input).unwrap();
    let resp = client.execute(req, TIMEOUT).unwrap();
    assert_eq!(resp.check(200, Some("application/json")), ResponseCheck::Passed);

    let bytes = accumulate(resp.body.chunks()).unwrap();
    let echo: Echo<Todo> = decode_json(&bytes).unwrap();
    assert_eq!(echo.json, input);
    assert_eq!(echo.json.title, "foo");

    client.shutdown().unwrap();
}

#[test]
fn echo_without_json_fails_typed_decode() {
    let base = start_server();
    let client = client();

    let req = HttpRequest::post(format!("{base}/post")).body("not json");
    let resp = client.execute(req, TIMEOUT).unwrap();
    let bytes = resp.body.collect(1024 * 1024).unwrap();
    let err = decode_json::<Echo<Todo>>(&bytes).unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));

    client.shutdown().unwrap();
}

#[test]
fn status_mismatch_is_reported_not_raised() {
    let base = start_server();
    let client = client();

    let resp = client
        .execute(HttpRequest::post(format!("{base}/status/500")), TIMEOUT)
        .unwrap();
    assert_eq!(resp.check(200, None), ResponseCheck::UnexpectedStatus(500));

    client.shutdown().unwrap();
}

#[test]
fn bounded_buffering_rejects_oversized_body() {
    let base = start_server();
    let client = client();

    let resp = client
        .execute(HttpRequest::get(format!("{base}/bytes/4096")), TIMEOUT)
        .unwrap();
    let err = resp.body.collect(1024).unwrap_err();
    assert!(matches!(err, ClientError::PayloadTooLarge { limit: 1024 }));

    client.shutdown().unwrap();
}

#[test]
fn chunked_stream_accumulates_identically() {
    let base = start_server();
    let client = client();

    let mut buffers = Vec::new();
    for chunk_size in [17, 4096] {
        let url = format!("{base}/stream-bytes/20000?chunk_size={chunk_size}");
        let resp = client.execute(HttpRequest::get(url), TIMEOUT).unwrap();
        assert_eq!(resp.content_length(), None);
        buffers.push(accumulate(resp.body.chunks()).unwrap());
    }

    assert_eq!(buffers[0], buffers[1]);
    assert_eq!(buffers[0].to_vec(), mock_server::pattern(20000));

    client.shutdown().unwrap();
}

#[test]
fn slow_server_times_out() {
    let base = start_server();
    let client = client();

    let err = client
        .execute(
            HttpRequest::get(format!("{base}/delay/3")),
            Duration::from_millis(200),
        )
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout), "got {err:?}");

    client.shutdown().unwrap();
}

/// Serve one response whose head announces 100 bytes but whose body stops
/// after three, then hold the connection open.
fn start_stalling_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }
        let _ = stream.write_all(
            b"HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\ncontent-length: 100\r\n\r\nabc",
        );
        let _ = stream.flush();
        std::thread::sleep(Duration::from_secs(3));
    });

    format!("http://{addr}")
}

#[test]
fn stalled_body_times_out() {
    let base = start_stalling_server();
    let client = client();

    let resp = client
        .execute(
            HttpRequest::get(format!("{base}/stall")),
            Duration::from_millis(300),
        )
        .unwrap();
    assert_eq!(resp.status, 200);

    let err = resp.body.collect(1024).unwrap_err();
    assert!(matches!(err, ClientError::Timeout), "got {err:?}");

    client.shutdown().unwrap();
}

#[test]
fn refused_connection_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = client();

    let err = client
        .execute(HttpRequest::get(format!("http://127.0.0.1:{port}/")), TIMEOUT)
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");

    client.shutdown().unwrap();
}

#[test]
fn malformed_url_fails_at_execution() {
    let client = client();
    let err = client
        .execute(HttpRequest::get("not a url"), TIMEOUT)
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
    client.shutdown().unwrap();
}

#[test]
fn download_writes_announced_length() {
    let base = start_server();
    let client = client();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("600x400.png");

    let mut last = None;
    let result = client
        .download(
            HttpRequest::get(format!("{base}/600x400.png")),
            FileDownload::create(&target).unwrap(),
            |p| last = Some(*p),
        )
        .unwrap();

    let last = last.expect("at least one progress event");
    let on_disk = std::fs::metadata(&target).unwrap().len();
    assert_eq!(result.status, 200);
    assert_eq!(on_disk, last.received_bytes);
    assert_eq!(last.total_bytes, Some(on_disk));
    assert_eq!(on_disk as usize, mock_server::placeholder_png(600, 400).len());

    client.shutdown().unwrap();
}

#[test]
fn download_of_chunked_body_has_no_total() {
    let base = start_server();
    let client = client();
    let dir = tempfile::tempdir().unwrap();

    let result = client
        .download(
            HttpRequest::get(format!("{base}/stream-bytes/3000?chunk_size=500")),
            FileDownload::create(dir.path().join("stream.bin")).unwrap(),
            |p| assert_eq!(p.total_bytes, None),
        )
        .unwrap();
    assert_eq!(result.received_bytes, 3000);
    assert_eq!(result.total_bytes, None);

    client.shutdown().unwrap();
}

#[test]
fn client_is_unusable_after_shutdown() {
    let base = start_server();
    let client = client();

    let resp = client
        .execute(HttpRequest::post(format!("{base}/post")), TIMEOUT)
        .unwrap();
    assert_eq!(resp.status, 200);
    drop(resp);

    client.shutdown().unwrap();
    let err = client
        .execute(HttpRequest::post(format!("{base}/post")), TIMEOUT)
        .unwrap_err();
    assert!(matches!(err, ClientError::Shutdown));
}
