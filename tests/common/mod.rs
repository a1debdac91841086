//! Shared harness for the HTTP integration tests
//!
//! Builds the full router over a temporary storage base and audit log with
//! a small static directory, and drives it in-process with `oneshot`.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use homedrive::auth::StaticDirectory;
use homedrive::http_server::{build_router, AppState, ServerConfig};

pub const SECRET: &str = "integration-test-secret";
pub const BOUNDARY: &str = "homedrive-test-boundary";

pub struct TestServer {
    pub temp: TempDir,
    pub config: ServerConfig,
    pub router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

impl TestServer {
    /// alice/wonderland and bob/builder have uids; ghost/boo has none
    pub fn start() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = ServerConfig {
            storage_base: temp.path().join("home"),
            audit_log: temp.path().join("logs").join("audit.log"),
            cors_origins: Vec::new(),
            ..ServerConfig::default()
        };

        let directory = StaticDirectory::new();
        directory.add_user("alice", Some("alice"), "wonderland").unwrap();
        directory.add_user("bob", Some("bob"), "builder").unwrap();
        directory.add_user("ghost", None, "boo").unwrap();

        let state = Arc::new(AppState::with_file_audit(
            &config,
            SECRET.to_string(),
            Arc::new(directory),
        ));
        let router = build_router(&config, state);

        Self {
            temp,
            config,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": username, "password": password }).to_string(),
            ))
            .unwrap();
        self.send(request).await
    }

    pub async fn token(&self, username: &str, password: &str) -> String {
        let response = self.login(username, password).await;
        assert_eq!(response.status, StatusCode::OK, "login failed for {}", username);
        response.json()["token"].as_str().unwrap().to_string()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(authorized("GET", uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(authorized("DELETE", uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn upload(&self, token: &str, filename: &str, content: &[u8]) -> TestResponse {
        let request = authorized("POST", "/upload", Some(token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body("file", filename, content)))
            .unwrap();
        self.send(request).await
    }

    pub fn namespace_root(&self, user: &str) -> PathBuf {
        self.config.storage_base.join(user)
    }

    pub fn audit_lines(&self) -> Vec<String> {
        fs::read_to_string(&self.config.audit_log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn authorized(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

pub fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"{n}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n",
        b = BOUNDARY,
        f = field,
        n = filename
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}
