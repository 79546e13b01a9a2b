//! Tests the metadata write-back against a stubbed provider endpoint.
//!
//! A one-shot TCP listener stands in for the management API so the tests
//! can assert the exact request the client puts on the wire: method, path,
//! bearer token, and the `public_metadata.user_id` body.

use std::time::Duration;

use idsync_identity::{IdentityClient, IdentityConfig, IdentityError};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};
use uuid::Uuid;

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Serves exactly one HTTP exchange, answering with the given status line.
///
/// Returns the base URL to point the client at and a handle resolving to
/// the raw request the stub received.
async fn stub_provider(status_line: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub listener");
    let addr = listener.local_addr().expect("stub listener address");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");

        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.expect("read request");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);

            let Some(header_end) = find_subslice(&request, b"\r\n\r\n") else {
                continue;
            };

            let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            if request.len() >= header_end + 4 + content_length {
                break;
            }
        }

        let response = format!(
            "{status_line}\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{{}}"
        );
        socket.write_all(response.as_bytes()).await.expect("write response");
        socket.shutdown().await.expect("close connection");

        String::from_utf8_lossy(&request).to_string()
    });

    (format!("http://{addr}"), handle)
}

fn stub_client(base_url: String) -> IdentityClient {
    IdentityClient::new(IdentityConfig {
        base_url,
        api_token: "sk_test_token".to_string(),
        timeout: Duration::from_secs(2),
        user_agent: "idsync-test".to_string(),
    })
    .expect("client builds")
}

#[tokio::test]
async fn metadata_patch_targets_provider_user_and_carries_local_id() {
    let (base_url, stub) = stub_provider("HTTP/1.1 200 OK").await;
    let client = stub_client(base_url);
    let local_id = Uuid::new_v4();

    client.update_user_metadata("user_2abc", local_id).await.expect("stub accepts the patch");

    let request = stub.await.expect("stub completes");
    let (head, body) = request.split_once("\r\n\r\n").expect("request has a body");

    assert!(
        head.starts_with("PATCH /users/user_2abc/metadata HTTP/1.1"),
        "unexpected request line: {head}"
    );
    assert!(head.to_ascii_lowercase().contains("authorization: bearer sk_test_token"));

    let json: serde_json::Value = serde_json::from_str(body).expect("body is JSON");
    assert_eq!(json["public_metadata"]["user_id"], local_id.to_string());
}

#[tokio::test]
async fn provider_rejection_surfaces_as_api_error() {
    let (base_url, stub) = stub_provider("HTTP/1.1 422 Unprocessable Entity").await;
    let client = stub_client(base_url);

    let err = client
        .update_user_metadata("user_1", Uuid::new_v4())
        .await
        .expect_err("4xx must fail the call");

    assert!(matches!(err, IdentityError::Api { status_code: 422 }));
    stub.await.expect("stub completes");
}

#[tokio::test]
async fn provider_server_error_surfaces_as_api_error() {
    let (base_url, stub) = stub_provider("HTTP/1.1 503 Service Unavailable").await;
    let client = stub_client(base_url);

    let err = client
        .update_user_metadata("user_1", Uuid::new_v4())
        .await
        .expect_err("5xx must fail the call");

    assert!(matches!(err, IdentityError::Api { status_code: 503 }));
    stub.await.expect("stub completes");
}
