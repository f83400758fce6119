//! REST client against a local one-shot HTTP server.

use std::collections::HashMap;

use matchhub_client::{ApiClient, ErrorCode, models::MatchMode};
use matchhub_core::RoomId;
use serde_json::{Value, json};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};
use url::Url;

#[derive(Debug)]
struct Recorded {
    method: String,
    target: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Recorded {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Accept one request, answer with `status` and `body`, report what arrived.
async fn serve_once(status: u16, body: &'static str) -> (ApiClient, oneshot::Receiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client hung up before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next().unwrap().split(' ');
        let method = request_line.next().unwrap().to_string();
        let target = request_line.next().unwrap().to_string();
        let headers: HashMap<String, String> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        let length: usize = headers.get("content-length").map_or(0, |v| v.parse().unwrap());
        while buf.len() < header_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client hung up before sending the body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let request_body = buf[header_end..header_end + length].to_vec();

        let response = format!(
            "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        let _ = tx.send(Recorded { method, target, headers, body: request_body });
    });

    (ApiClient::with_http(base, reqwest::Client::new()), rx)
}

#[tokio::test]
async fn verify_otp_posts_credentials_and_decodes_the_session() {
    let (api, request) = serve_once(
        200,
        r#"{"user":{"user_uuid":"u-1","anonymous_handle":"Blue Fox","email":"a@b.c"},"access":"acc","refresh":"ref"}"#,
    )
    .await;

    let session = api.verify_otp("a@b.c", "123456").await.unwrap();
    assert_eq!(session.user.anonymous_handle, "Blue Fox");
    assert_eq!(session.tokens().access, "acc");

    let request = request.await.unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.target, "/api/auth/verify-otp/");
    assert_eq!(request.headers.get("content-type").map(String::as_str), Some("application/json"));
    assert!(!request.headers.contains_key("authorization"));
    assert_eq!(request.json(), json!({ "email": "a@b.c", "otp": "123456" }));
}

#[tokio::test]
async fn authenticated_requests_carry_the_bearer_token() {
    let (api, request) = serve_once(
        200,
        r#"[{"id":"room-1","user_a_handle":"Blue Fox","user_b_handle":"Red Owl","is_locked":false}]"#,
    )
    .await;

    let rooms = api.chat_rooms("jwt-token").await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].id.as_str(), "room-1");

    let request = request.await.unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.headers.get("authorization").map(String::as_str), Some("Bearer jwt-token"));
}

#[tokio::test]
async fn history_pages_escape_the_room_id() {
    let (api, request) = serve_once(200, "[]").await;

    let messages = api.room_messages_page("jwt", &RoomId::new("a b"), 2).await.unwrap();
    assert!(messages.is_empty());

    let request = request.await.unwrap();
    assert_eq!(request.target, "/api/chat-rooms/a%20b/messages/?page=2");
}

#[tokio::test]
async fn create_match_sends_mode_in_lowercase() {
    let (api, request) = serve_once(201, r#"{"id":7,"mode":"hookup"}"#).await;

    api.create_match("jwt", "u-2", MatchMode::Hookup).await.unwrap();

    let request = request.await.unwrap();
    assert_eq!(request.target, "/api/matching/create_match/");
    assert_eq!(request.json(), json!({ "target_user_id": "u-2", "mode": "hookup" }));
}

#[tokio::test]
async fn server_errors_carry_status_code_and_message() {
    let (api, _request) = serve_once(400, r#"{"detail":"Invalid OTP"}"#).await;

    let err = api.verify_otp("a@b.c", "000000").await.unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, ErrorCode::BadRequest);
    insta::assert_snapshot!(err, @"Invalid OTP (BAD_REQUEST, status 400)");
}

#[tokio::test]
async fn locked_and_expired_rooms_map_to_codes() {
    let (api, _request) = serve_once(410, r#"{"error":"Chat expired"}"#).await;
    let err = api.room_messages("jwt", &RoomId::new("room-1")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ChatExpired);
    assert_eq!(err.message, "Chat expired");

    let (api, _request) = serve_once(500, "<html>oops</html>").await;
    let err = api.profile("jwt").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ServerError);
    assert_eq!(err.message, "Request failed");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    drop(listener);

    let api = ApiClient::with_http(base, reqwest::Client::new());
    let err = api.profile("jwt").await.unwrap_err();
    assert_eq!(err.status, 0);
    assert_eq!(err.code, ErrorCode::Network);
}

#[tokio::test]
async fn upload_sends_a_multipart_file_part() {
    let (api, request) = serve_once(200, r#"{"url":"https://cdn.example/v.webm"}"#).await;

    let url = api.upload_file("jwt", "note.webm", b"voice-bytes".to_vec()).await.unwrap();
    assert_eq!(url, "https://cdn.example/v.webm");

    let request = request.await.unwrap();
    assert_eq!(request.target, "/api/upload/");
    assert!(request.headers["content-type"].starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains(r#"name="file"; filename="note.webm""#));
    assert!(body.contains("voice-bytes"));
}

#[tokio::test]
async fn refresh_keeps_the_old_refresh_token_unless_rotated() {
    let (api, request) = serve_once(200, r#"{"access":"new-access"}"#).await;
    let tokens = api.refresh_access("old-refresh").await.unwrap();
    assert_eq!(tokens.access, "new-access");
    assert_eq!(tokens.refresh, "old-refresh");
    assert_eq!(request.await.unwrap().json(), json!({ "refresh": "old-refresh" }));

    let (api, _request) = serve_once(200, r#"{"access":"a2","refresh":"r2"}"#).await;
    let tokens = api.refresh_access("old-refresh").await.unwrap();
    assert_eq!(tokens.refresh, "r2");
}
