use extguard::http::handle_request::{ExtguardState, handle_request};
use extguard::http::http_server::{bind_listener, serve};
use extguard::http::request_response::extguard_request::{ExtguardRequest, MAX_REQUEST_BODY_SIZE};
use extguard::http::request_response::extguard_response::ExtguardResponse;
use extguard::policy::policy_store::PolicyStore;
use hyper::Request;
use hyper::body::Bytes;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tokio_util::sync::CancellationToken;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn new_state(public_dir: Option<PathBuf>) -> ExtguardState {
    let store = PolicyStore::open_in_memory().expect("in-memory store should open");
    ExtguardState::new(Arc::new(store), public_dir)
}

async fn send(state: &ExtguardState, method: &str, uri: &str, body: &str) -> ExtguardResponse {
    let request = Request::builder().method(method).uri(uri).body(Bytes::from(body.to_string())).expect("valid request");
    handle_request(ExtguardRequest::new(request), state).await
}

fn json_body(response: &ExtguardResponse) -> Value {
    serde_json::from_slice(response.get_body_bytes()).expect("response body should be JSON")
}

fn assert_error(response: &ExtguardResponse, status: u16, message: &str) {
    assert_eq!(response.get_status(), status);
    assert_eq!(json_body(response), json!({ "error": message }));
}

#[tokio::test]
async fn test_get_extensions() {
    let state = new_state(None);
    let response = send(&state, "GET", "/api/extensions", "").await;

    assert_eq!(response.get_status(), 200);
    assert_eq!(response.headers().get("Content-Type").unwrap(), "application/json");
    assert_eq!(response.headers().get("Server").unwrap(), "extguard");
    assert_eq!(response.headers().get("Access-Control-Allow-Origin").unwrap(), "*");

    let body = json_body(&response);
    assert_eq!(body["fixedExtensions"].as_array().unwrap().len(), 7);
    assert_eq!(body["fixedExtensions"][0], json!({ "name": "bat", "blocked": false }));
    assert_eq!(body["customExtensions"], json!([]));
    assert_eq!(body["fileSizeLimit"], 0);
}

#[tokio::test]
async fn test_put_fixed_extension() {
    let state = new_state(None);

    let response = send(&state, "PUT", "/api/extensions/fixed/exe", r#"{"blocked": true}"#).await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(json_body(&response), json!({ "success": true }));

    // Names in the path are matched case-insensitively
    let response = send(&state, "PUT", "/api/extensions/fixed/BAT", r#"{"blocked": true}"#).await;
    assert_eq!(response.get_status(), 200);

    let body = json_body(&send(&state, "GET", "/api/extensions", "").await);
    let blocked: Vec<&str> = body["fixedExtensions"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["blocked"] == true)
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(blocked, vec!["bat", "exe"]);

    let response = send(&state, "PUT", "/api/extensions/fixed/docx", r#"{"blocked": true}"#).await;
    assert_error(&response, 404, "Extension not found");

    let response = send(&state, "PUT", "/api/extensions/fixed/..exe", r#"{"blocked": false}"#).await;
    assert_error(&response, 404, "Extension not found");

    for bad_body in ["", "{}", r#"{"blocked": "yes"}"#, "not json"] {
        let response = send(&state, "PUT", "/api/extensions/fixed/exe", bad_body).await;
        assert_error(&response, 400, "Invalid request body");
    }
}

#[tokio::test]
async fn test_post_custom_extension() {
    let state = new_state(None);

    let response = send(&state, "POST", "/api/extensions/custom", r#"{"extension": "SH"}"#).await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(json_body(&response), json!({ "success": true }));

    let response = send(&state, "POST", "/api/extensions/custom", r#"{"extension": "sh"}"#).await;
    assert_error(&response, 400, "Extension already exists");

    let response = send(&state, "POST", "/api/extensions/custom", r#"{"extension": ""}"#).await;
    assert_error(&response, 400, "Invalid extension length");

    let response = send(&state, "POST", "/api/extensions/custom", r#"{}"#).await;
    assert_error(&response, 400, "Invalid extension length");

    let response = send(&state, "POST", "/api/extensions/custom", r#"{"extension": "abcdefghijklmnopqrstu"}"#).await;
    assert_error(&response, 400, "Invalid extension length");

    let response = send(&state, "POST", "/api/extensions/custom", r#"{"extension": "tar.gz"}"#).await;
    assert_error(&response, 400, "Invalid extension format");

    let body = json_body(&send(&state, "GET", "/api/extensions", "").await);
    assert_eq!(body["customExtensions"], json!(["sh"]));
}

#[tokio::test]
async fn test_custom_extension_limit() {
    let state = new_state(None);
    for i in 0..200 {
        state.policy_store.add_custom(&format!("e{}", i)).unwrap();
    }

    let response = send(&state, "POST", "/api/extensions/custom", r#"{"extension": "last"}"#).await;
    assert_error(&response, 400, "Maximum custom extensions limit reached");
    assert_eq!(state.policy_store.count_custom().unwrap(), 200);
}

#[tokio::test]
async fn test_delete_custom_extension() {
    let state = new_state(None);
    state.policy_store.add_custom("sh").unwrap();
    state.policy_store.add_custom("zip").unwrap();

    let response = send(&state, "DELETE", "/api/extensions/custom/sh", "").await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(json_body(&response), json!({ "success": true }));

    let response = send(&state, "DELETE", "/api/extensions/custom/sh", "").await;
    assert_error(&response, 404, "Extension not found");

    // Percent-encoded path parameters are decoded
    let response = send(&state, "DELETE", "/api/extensions/custom/%5Aip", "").await;
    assert_eq!(response.get_status(), 200);
    assert!(state.policy_store.list_custom().unwrap().is_empty());
}

#[tokio::test]
async fn test_file_size_limit() {
    let state = new_state(None);

    let response = send(&state, "GET", "/api/settings/file-size-limit", "").await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(json_body(&response), json!({ "fileSizeLimit": 0 }));

    let response = send(&state, "PUT", "/api/settings/file-size-limit", r#"{"limit": 100}"#).await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(json_body(&response), json!({ "success": true }));
    assert_eq!(json_body(&send(&state, "GET", "/api/settings/file-size-limit", "").await), json!({ "fileSizeLimit": 100 }));

    // Fractions are floored
    let response = send(&state, "PUT", "/api/settings/file-size-limit", r#"{"limit": 12.7}"#).await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(state.policy_store.get_size_limit_mb().unwrap(), 12);

    for bad_body in [r#"{"limit": 1025}"#, r#"{"limit": -1}"#, r#"{"limit": "10"}"#, r#"{}"#, "garbage"] {
        let response = send(&state, "PUT", "/api/settings/file-size-limit", bad_body).await;
        assert_error(&response, 400, "Invalid file size limit. Must be between 0-1024 MB.");
    }
    assert_eq!(state.policy_store.get_size_limit_mb().unwrap(), 12);

    let response = send(&state, "PUT", "/api/settings/file-size-limit", r#"{"limit": 1024}"#).await;
    assert_eq!(response.get_status(), 200);
    let response = send(&state, "PUT", "/api/settings/file-size-limit", r#"{"limit": 0}"#).await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(state.policy_store.get_size_limit_mb().unwrap(), 0);
}

#[tokio::test]
async fn test_evaluate_files() {
    let state = new_state(None);
    state.policy_store.set_fixed_blocked("exe", true).unwrap();
    state.policy_store.add_custom("sh").unwrap();
    state.policy_store.set_size_limit_mb(1).unwrap();

    let request_body = json!({
        "files": [
            { "fileName": "virus.EXE", "fileSize": 10 },
            { "fileName": "run.sh", "fileSize": 10 },
            { "fileName": "big.txt", "fileSize": 1024 * 1024 + 1 },
            { "fileName": "readme", "fileSize": 10 }
        ]
    });
    let response = send(&state, "POST", "/api/evaluate", &request_body.to_string()).await;
    assert_eq!(response.get_status(), 200);

    let body = json_body(&response);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(
        results[0],
        json!({ "fileName": "virus.EXE", "fileSize": 10, "extension": "exe", "blockedByExtension": true, "blockedBySize": false, "blocked": true })
    );
    assert_eq!(results[1]["blockedByExtension"], true);
    assert_eq!(results[2]["blockedBySize"], true);
    assert_eq!(results[2]["blockedByExtension"], false);
    assert_eq!(results[3]["extension"], Value::Null);
    assert_eq!(results[3]["blocked"], false);

    let response = send(&state, "POST", "/api/evaluate", r#"{"files": [{"fileName": "a.txt"}]}"#).await;
    assert_error(&response, 400, "Invalid request body");
}

#[tokio::test]
async fn test_healthcheck() {
    let state = new_state(None);
    let response = send(&state, "GET", "/api/healthcheck", "").await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(response.get_body_bytes().as_ref(), b"The server is healthy");
}

#[tokio::test]
async fn test_unknown_routes_and_methods() {
    let state = new_state(None);

    assert_error(&send(&state, "GET", "/api/nothing-here", "").await, 404, "Not found");
    assert_error(&send(&state, "GET", "/api/extensions/fixed", "").await, 404, "Not found");
    assert_error(&send(&state, "DELETE", "/api/extensions", "").await, 405, "Method not allowed");
    assert_error(&send(&state, "GET", "/api/extensions/custom", "").await, 405, "Method not allowed");
    assert_error(&send(&state, "POST", "/api/settings/file-size-limit", "").await, 405, "Method not allowed");
}

#[tokio::test]
async fn test_cors_preflight() {
    let state = new_state(None);
    let response = send(&state, "OPTIONS", "/api/extensions/custom", "").await;

    assert_eq!(response.get_status(), 204);
    assert!(response.get_body_bytes().is_empty());
    assert_eq!(response.headers().get("Access-Control-Allow-Origin").unwrap(), "*");
    assert_eq!(response.headers().get("Access-Control-Allow-Methods").unwrap(), "GET, POST, PUT, DELETE, OPTIONS");
    assert_eq!(response.headers().get("Access-Control-Allow-Headers").unwrap(), "Content-Type");
}

#[tokio::test]
async fn test_static_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>extguard</html>").unwrap();
    std::fs::write(dir.path().join("app.css"), "body {}").unwrap();
    let state = new_state(Some(dir.path().to_path_buf()));

    let response = send(&state, "GET", "/", "").await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(response.headers().get("Content-Type").unwrap(), "text/html");
    assert_eq!(response.get_body_bytes().as_ref(), b"<html>extguard</html>");

    let response = send(&state, "GET", "/app.css", "").await;
    assert_eq!(response.get_status(), 200);
    assert_eq!(response.headers().get("Content-Type").unwrap(), "text/css");

    assert_error(&send(&state, "GET", "/missing.js", "").await, 404, "Not found");
    assert_error(&send(&state, "GET", "/../Cargo.toml", "").await, 400, "Invalid path");
    assert_error(&send(&state, "GET", "/%2e%2e/Cargo.toml", "").await, 400, "Invalid path");
    assert_error(&send(&state, "POST", "/index.html", "").await, 405, "Method not allowed");
}

#[tokio::test]
async fn test_static_files_disabled_without_public_dir() {
    let state = new_state(None);
    assert_error(&send(&state, "GET", "/", "").await, 404, "Not found");
}

/// Send a raw HTTP/1.1 request and read until the server closes the connection
async fn send_raw_http_request(addr: std::net::SocketAddr, request: &[u8]) -> String {
    let mut stream = timeout(TEST_TIMEOUT, TcpStream::connect(addr)).await.unwrap().unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    timeout(TEST_TIMEOUT, stream.read_to_end(&mut response)).await.unwrap().unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_server_end_to_end() {
    let state = Arc::new(new_state(None));
    let listener = bind_listener("127.0.0.1", 0).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let token = CancellationToken::new();
    let server = tokio::spawn(serve(listener, state.clone(), token.clone()));

    let body = r#"{"extension": "bat2"}"#;
    let request = format!(
        "POST /api/extensions/custom HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let response = send_raw_http_request(addr, request.as_bytes()).await;
    assert!(response.starts_with("HTTP/1.1 200"), "response: {}", response);
    assert!(response.ends_with(r#"{"success":true}"#), "response: {}", response);
    assert_eq!(state.policy_store.list_custom().unwrap(), vec!["bat2"]);

    let response = send_raw_http_request(addr, b"GET /api/extensions HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200"), "response: {}", response);
    assert!(response.to_ascii_lowercase().contains("server: extguard"));
    let json_start = response.find("\r\n\r\n").unwrap() + 4;
    let body: Value = serde_json::from_str(&response[json_start..]).unwrap();
    assert_eq!(body["customExtensions"], json!(["bat2"]));

    // One byte over the cap
    let oversized = "a".repeat(MAX_REQUEST_BODY_SIZE + 1);
    let request = format!(
        "POST /api/evaluate HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        oversized.len(),
        oversized
    );
    let response = send_raw_http_request(addr, request.as_bytes()).await;
    assert!(response.starts_with("HTTP/1.1 413"), "response: {}", response);
    assert!(response.ends_with(r#"{"error":"Request body too large"}"#), "response: {}", response);

    token.cancel();
    timeout(TEST_TIMEOUT, server).await.unwrap().unwrap();
}
