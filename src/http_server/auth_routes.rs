//! Auth HTTP Routes
//!
//! `POST /api/login` backed by the [`CredentialIssuer`].
//!
//! [`CredentialIssuer`]: crate::auth::issuer::CredentialIssuer

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};

use super::server::AppState;
use crate::auth::errors::AuthError;
use crate::auth::issuer::{Identity, LoginOutcome};

/// Login routes with shared state
pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/login", post(login_handler))
        .with_state(state)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub dn: String,
}

impl From<&Identity> for UserResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.user_id.clone(),
            dn: identity.distinguished_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserResponse,
    pub token: String,
    pub expires_at: String,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            success: true,
            user: UserResponse::from(&outcome.identity),
            token: outcome.token.token,
            expires_at: outcome.token.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginFailure {
    pub success: bool,
    pub message: String,
}

impl From<&AuthError> for LoginFailure {
    fn from(err: &AuthError) -> Self {
        let message = if err.is_client_error() {
            err.to_string()
        } else {
            "Login failed".to_string()
        };
        Self {
            success: false,
            message,
        }
    }
}

// ==================
// Handlers
// ==================

/// Login handler
async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<LoginFailure>)> {
    // Argon2 verification is CPU-bound; keep it off the async workers.
    let worker_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        worker_state
            .issuer
            .login(&request.username, &request.password)
    })
    .await
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "login task failed");
        Err(AuthError::TokenGenerationFailed)
    });

    match result {
        Ok(outcome) => Ok(Json(LoginResponse::from(outcome))),
        Err(e) => {
            if !e.is_client_error() {
                tracing::error!(error = %e, "login failed");
            }
            let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::UNAUTHORIZED);
            Err((status, Json(LoginFailure::from(&e))))
        }
    }
}
