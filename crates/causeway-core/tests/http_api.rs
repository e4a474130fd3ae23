use std::time::Duration;

use causeway_core::TaggingError;
use causeway_core::api::{CategoryApi, HttpCategoryApi};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve exactly one canned response and hand back the raw request text.
async fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            if request_complete(&raw) {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&raw).to_string());
    });

    (format!("http://{addr}/"), rx)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some((head, body)) = text.split_once("\r\n\r\n") else {
        return false;
    };
    let length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    body.len() >= length
}

#[tokio::test]
async fn fetch_decodes_feed_and_sends_bearer_when_given() {
    let (base, request) = one_shot_server(
        "200 OK",
        r#"[{"id":1,"name":"Beach Cleanup","classifications":[{"classification":"Environment"}]}]"#,
    )
    .await;
    let api = HttpCategoryApi::new(&base, Duration::from_secs(5)).expect("api");

    let feed = api.fetch_categories(Some("tok-9")).await.expect("fetch");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].name, "Beach Cleanup");

    let raw = request.await.expect("captured request");
    assert!(raw.starts_with("GET /missions/categories/ HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer tok-9"));
}

#[tokio::test]
async fn fetch_maps_error_status() {
    let (base, _request) = one_shot_server("503 Service Unavailable", "").await;
    let api = HttpCategoryApi::new(&base, Duration::from_secs(5)).expect("api");

    let err = api.fetch_categories(None).await.expect_err("503");
    assert_eq!(
        err,
        TaggingError::Fetch {
            status: Some(503),
            message: "Service Unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn replace_puts_full_selection() {
    let (base, request) = one_shot_server("200 OK", r#"{"categories":[1,3]}"#).await;
    let api = HttpCategoryApi::new(&base, Duration::from_secs(5)).expect("api");

    api.replace_user_categories("tok-1", &[1, 3]).await.expect("put");

    let raw = request.await.expect("captured request");
    assert!(raw.starts_with("PUT /missions/categories/user/ HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer tok-1"));
    assert!(raw.ends_with(r#"{"categories":[1,3]}"#));
}

#[tokio::test]
async fn replace_maps_rejection_to_submit_error() {
    let (base, _request) = one_shot_server("400 Bad Request", "categories required").await;
    let api = HttpCategoryApi::new(&base, Duration::from_secs(5)).expect("api");

    let err = api.replace_user_categories("tok-1", &[2]).await.expect_err("400");
    assert_eq!(err, TaggingError::submit(Some(400), "categories required"));
}
