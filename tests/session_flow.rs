//! End-to-end session tests
//!
//! Login, then the full file lifecycle over HTTP, checking both the
//! responses and the audit trail they leave behind.

mod common;

use axum::http::{header, StatusCode};
use common::TestServer;

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_returns_token_and_provisions_namespace() {
    let server = TestServer::start();

    let response = server.login("alice", "wonderland").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["id"], "alice");
    assert_eq!(body["user"]["dn"], "uid=alice,ou=people,dc=homedrive");
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert!(body["expires_at"].is_string());

    let root = server.namespace_root("alice");
    assert!(root.join("uploads").is_dir());
    assert!(root.join("README.txt").is_file());
}

#[tokio::test]
async fn test_second_login_keeps_existing_files() {
    let server = TestServer::start();
    let token = server.token("alice", "wonderland").await;
    server.upload(&token, "keep.txt", b"keep me").await;

    let token = server.token("alice", "wonderland").await;
    let listed = server.get("/files", Some(&token)).await.json();
    assert_eq!(listed["files"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_wrong_password_is_rejected_and_audited() {
    let server = TestServer::start();

    let response = server.login("alice", "not-the-password").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["success"], false);
    assert_eq!(response.json()["message"], "Invalid credentials");
    assert!(response.json().get("token").is_none());

    let lines = server.audit_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" - failed-login by alice"), "{}", lines[0]);
    assert!(!server.namespace_root("alice").exists());
}

#[tokio::test]
async fn test_unknown_user_is_rejected() {
    let server = TestServer::start();
    let response = server.login("mallory", "whatever").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(server.audit_lines()[0].ends_with("failed-login by mallory"));
}

#[tokio::test]
async fn test_entry_without_uid_gets_no_session() {
    let server = TestServer::start();

    let response = server.login("ghost", "boo").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.json().get("token").is_none());
    assert!(!server.namespace_root("ghost").exists());
}

#[tokio::test]
async fn test_missing_fields_are_a_bad_request() {
    let server = TestServer::start();

    let response = server.login("", "").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(server.audit_lines().is_empty());
}

// =============================================================================
// File lifecycle
// =============================================================================

#[tokio::test]
async fn test_full_file_lifecycle_is_audited_in_order() {
    let server = TestServer::start();
    let token = server.token("alice", "wonderland").await;
    let content: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    // Upload
    let response = server.upload(&token, "report.pdf", &content).await;
    assert_eq!(response.status, StatusCode::CREATED);
    let stored = response.json()["filename"].as_str().unwrap().to_string();
    assert!(stored.ends_with("-report.pdf"));
    let (millis, _) = stored.split_once('-').unwrap();
    assert!(millis.parse::<i64>().is_ok());

    // List
    let listed = server.get("/files", Some(&token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.json()["files"][0]["name"], stored.as_str());
    assert_eq!(listed.json()["files"].as_array().unwrap().len(), 1);

    // View
    let viewed = server.get(&format!("/view/{}", stored), Some(&token)).await;
    assert_eq!(viewed.status, StatusCode::OK);
    assert!(viewed.json()["content"].is_string());

    // Download
    let downloaded = server
        .get(&format!("/download/{}", stored), Some(&token))
        .await;
    assert_eq!(downloaded.status, StatusCode::OK);
    assert_eq!(downloaded.body.as_ref(), content.as_slice());
    let disposition = downloaded.headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(&stored));

    // Delete
    let deleted = server
        .delete(&format!("/delete/{}", stored), Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json()["message"], "File deleted successfully");

    let listed = server.get("/files", Some(&token)).await;
    assert!(listed.json()["files"].as_array().unwrap().is_empty());

    let lines = server.audit_lines();
    let expected = [
        "login by alice".to_string(),
        format!("upload by alice on file {}", stored),
        format!("view by alice on file {}", stored),
        format!("download by alice on file {}", stored),
        format!("delete by alice on file {}", stored),
    ];
    assert_eq!(lines.len(), expected.len(), "{:?}", lines);
    for (line, suffix) in lines.iter().zip(expected.iter()) {
        assert!(line.ends_with(suffix.as_str()), "{} !~ {}", line, suffix);
    }
}

#[tokio::test]
async fn test_view_text_file() {
    let server = TestServer::start();
    let token = server.token("alice", "wonderland").await;

    let stored = server.upload(&token, "notes.txt", "héllo\nworld".as_bytes()).await.json()
        ["filename"]
        .as_str()
        .unwrap()
        .to_string();

    let viewed = server.get(&format!("/view/{}", stored), Some(&token)).await;
    assert_eq!(viewed.json()["content"], "héllo\nworld");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let server = TestServer::start();
    let token = server.token("alice", "wonderland").await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", common::BOUNDARY),
        )
        .body(axum::body::Body::from(common::multipart_body(
            "attachment",
            "a.txt",
            b"x",
        )))
        .unwrap();

    let response = server.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "No file provided");
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let server = TestServer::start();
    let token = server.token("alice", "wonderland").await;

    for response in [
        server.delete("/delete/1-nope.txt", Some(&token)).await,
        server.get("/download/1-nope.txt", Some(&token)).await,
        server.get("/view/1-nope.txt", Some(&token)).await,
    ] {
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    let lines = server.audit_lines();
    let expected = [
        "login by alice",
        "delete by alice on file 1-nope.txt",
        "download by alice on file 1-nope.txt",
        "view by alice on file 1-nope.txt",
    ];
    assert_eq!(lines.len(), expected.len(), "{:?}", lines);
    for (line, suffix) in lines.iter().zip(expected.iter()) {
        assert!(line.ends_with(suffix), "{} !~ {}", line, suffix);
    }
}

#[tokio::test]
async fn test_traversal_attempt_is_audited() {
    let server = TestServer::start();
    let token = server.token("alice", "wonderland").await;

    let response = server
        .get("/view/..%2F..%2Fbob%2Fuploads%2Fx", Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let lines = server.audit_lines();
    assert_eq!(lines.len(), 2, "{:?}", lines);
    assert!(lines[1].ends_with("view by alice on file ../../bob/uploads/x"));
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start();
    let response = server.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "ok");
}
