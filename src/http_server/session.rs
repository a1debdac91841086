//! Session verification middleware
//!
//! Every file route runs behind [`require_session`]: the bearer token is
//! verified statelessly and the resulting [`IdentityContext`] is placed in
//! the request extensions for the handler.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::auth_error;
use super::server::AppState;
use crate::auth::errors::{AuthError, AuthResult};
use crate::auth::jwt::IdentityContext;

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> AuthResult<&str> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::MissingCredential)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingCredential);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// Verify the request's session and attach its identity
pub fn verify_request(state: &AppState, headers: &HeaderMap) -> AuthResult<IdentityContext> {
    let token = bearer_token(headers)?;
    state.signer.verify(token)
}

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match verify_request(&state, request.headers()) {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => auth_error(e).into_response(),
    }
}
