//! # homedrive HTTP Server Module
//!
//! Axum server exposing login and the per-user file operations.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/login` - Directory login, returns a bearer token
//! - `POST /upload` - Multipart upload (bearer)
//! - `GET /files` - List own files (bearer)
//! - `GET /download/:filename` - Attachment stream (bearer)
//! - `GET /view/:filename` - File as text (bearer)
//! - `DELETE /delete/:filename` - Remove a file (bearer)

pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod auth_routes;
pub mod file_routes;

pub use config::{ConfigError, ServerConfig, SECRET_ENV};
pub use server::{build_router, AppState, HttpServer};
