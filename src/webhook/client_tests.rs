//! Tests for `ReqwestClient`.
//!
//! The exchange tests run against a one-shot TCP listener on localhost that
//! answers with a canned HTTP/1.1 response.

use std::time::Duration;

use http::{HeaderName, HeaderValue, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::{HttpClient, HttpError, HttpRequest, ReqwestClient};

/// Serves a single connection with `response`, returning the raw request text.
async fn serve_once(response: String) -> (url::Url, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let raw = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        raw
    });

    let url = url::Url::parse(&format!("http://{addr}/hook")).unwrap();
    (url, handle)
}

/// Reads one request: headers, then `Content-Length` bytes of body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&raw).into_owned();
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if raw.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

/// A client that never routes through an environment proxy.
fn direct_client() -> ReqwestClient {
    ReqwestClient::from_client(reqwest::Client::builder().no_proxy().build().unwrap())
}

fn canned(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

mod reqwest_client {
    use super::*;

    #[test]
    fn default_creates_same_as_new() {
        let client1 = ReqwestClient::new();
        let client2 = ReqwestClient::default();

        assert!(format!("{client1:?}").contains("ReqwestClient"));
        assert!(format!("{client2:?}").contains("ReqwestClient"));
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestClient>();
    }

    #[tokio::test]
    async fn sends_method_headers_and_body() {
        let (url, server) = serve_once(canned("200 OK", "")).await;
        let req = HttpRequest::post(url)
            .with_header(
                HeaderName::from_static("x-job"),
                HeaderValue::from_static("backup"),
            )
            .with_body(b"hello".to_vec());

        let resp = direct_client().request(req).await.unwrap();
        let raw = server.await.unwrap();

        assert!(resp.is_success());
        assert!(raw.starts_with("POST /hook HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("x-job: backup"));
        assert!(raw.ends_with("hello"));
    }

    #[tokio::test]
    async fn non_success_response_is_returned_with_body() {
        let (url, server) = serve_once(canned("500 Internal Server Error", "boom")).await;

        let resp = direct_client()
            .request(HttpRequest::post(url))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body, b"boom");
    }

    #[tokio::test]
    async fn response_body_is_cut_at_the_limit() {
        let (url, server) = serve_once(canned("500 Internal Server Error", &"y".repeat(64))).await;

        let resp = direct_client()
            .with_body_limit(16)
            .request(HttpRequest::post(url))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(resp.body.len(), 16);
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let url = url::Url::parse(&format!("http://{addr}/")).unwrap();
        let req = HttpRequest::post(url).with_timeout(Duration::from_millis(100));

        let result = direct_client().request(req).await;
        server.abort();

        assert!(matches!(result, Err(HttpError::Timeout)));
    }

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = url::Url::parse(&format!("http://{addr}/")).unwrap();
        let result = direct_client().request(HttpRequest::post(url)).await;

        assert!(matches!(result, Err(HttpError::Connection(_))));
    }
}
