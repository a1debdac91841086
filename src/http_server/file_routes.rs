//! File HTTP Routes
//!
//! Upload, list, download, view and delete. All routes sit behind
//! [`require_session`]; handlers read the verified identity from the request
//! extensions and never take a path or owner from the client.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Extension, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::io::ReaderStream;

use super::error::{api_error, storage_error, ApiError};
use super::server::AppState;
use super::session::require_session;
use crate::auth::jwt::IdentityContext;

/// Multipart framing allowance on top of the file itself
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// File routes with shared state
pub fn file_routes(state: Arc<AppState>) -> Router {
    let body_limit = state
        .gateway
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/upload", post(upload_handler))
        .route("/files", get(list_handler))
        .route("/download/:filename", get(download_handler))
        .route("/view/:filename", get(view_handler))
        .route("/delete/:filename", delete(delete_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit).unwrap_or(usize::MAX),
        ))
        .with_state(state)
}

// ==================
// Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct FilesListResponse {
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ==================
// Handlers
// ==================

async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<IdentityContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

        let stored_name = state
            .gateway
            .upload(&ctx, &original_name, &data)
            .map_err(storage_error)?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                message: "File uploaded successfully".to_string(),
                filename: stored_name,
            }),
        ));
    }

    Err(api_error(StatusCode::BAD_REQUEST, "No file provided"))
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<IdentityContext>,
) -> Result<Json<FilesListResponse>, ApiError> {
    let names = state.gateway.list(&ctx).map_err(storage_error)?;

    Ok(Json(FilesListResponse {
        files: names.into_iter().map(|name| FileEntry { name }).collect(),
    }))
}

async fn download_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let download = state
        .gateway
        .download(&ctx, &filename)
        .map_err(storage_error)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(download.size));
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&download.stored_name),
    );

    let stream = ReaderStream::new(tokio::fs::File::from_std(download.file));
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

async fn view_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(filename): Path<String>,
) -> Result<Json<ViewResponse>, ApiError> {
    let content = state.gateway.view(&ctx, &filename).map_err(storage_error)?;
    Ok(Json(ViewResponse { content }))
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<IdentityContext>,
    Path(filename): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .gateway
        .delete(&ctx, &filename)
        .map_err(storage_error)?;

    Ok(Json(MessageResponse {
        message: "File deleted successfully".to_string(),
    }))
}

/// `attachment; filename="..."` with anything outside printable ASCII,
/// quotes and backslashes replaced by `_`
fn content_disposition(name: &str) -> HeaderValue {
    let safe: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
