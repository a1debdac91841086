//! # Auth Errors
//!
//! Error types for login and session verification.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication and session errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // ==================
    // Login Errors
    // ==================

    /// Username or password empty
    #[error("Username and password are required")]
    MissingCredentials,

    /// Directory rejected the credentials (generic - don't leak which part was wrong)
    #[error("Invalid credentials")]
    AuthenticationFailure,

    /// Directory entry has no `uid` attribute
    #[error("Directory identity is incomplete")]
    IdentityIncomplete,

    /// `uid` cannot be used as a namespace name
    #[error("Directory identity is not usable")]
    InvalidUserId,

    // ==================
    // Session Errors
    // ==================

    /// No bearer token on the request
    #[error("Missing authorization header")]
    MissingCredential,

    /// Signature check failed or token is malformed
    #[error("Invalid token")]
    InvalidCredential,

    /// Token is past its expiry
    #[error("Token expired")]
    ExpiredCredential,

    // ==================
    // Internal Errors
    // ==================

    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    /// Token generation failed
    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    /// Namespace provisioning failed during login
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Directory could not be loaded
    #[error("Directory error: {0}")]
    DirectoryError(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            AuthError::MissingCredentials => 400,

            // 401 Unauthorized
            AuthError::AuthenticationFailure => 401,
            AuthError::IdentityIncomplete => 401,
            AuthError::InvalidUserId => 401,
            AuthError::MissingCredential => 401,
            AuthError::InvalidCredential => 401,
            AuthError::ExpiredCredential => 401,

            // 500 Internal Server Error
            AuthError::HashingFailed => 500,
            AuthError::TokenGenerationFailed => 500,
            AuthError::StorageError(_) => 500,
            AuthError::DirectoryError(_) => 500,
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
