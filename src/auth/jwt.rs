//! # Session Tokens
//!
//! Signed, time-bounded session credentials (HS256 JWT).
//!
//! ## Invariants
//! - Stateless validation (no server-side session store, no revocation)
//! - A token is accepted while `now < exp` and never after
//! - Any modification of header, payload or signature fails validation

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::errors::{AuthError, AuthResult};

/// JWT claims for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (directory `uid`)
    pub sub: String,

    /// Namespace root bound to the subject
    pub storage_root: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,

    /// Audience
    pub aud: String,

    /// Issuer
    pub iss: String,
}

/// Verified caller identity attached to each authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub user_id: String,
    pub storage_root: PathBuf,
}

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret key for signing
    pub secret: String,

    /// Session lifetime
    pub ttl: Duration,

    /// Issuer identifier
    pub issuer: String,

    /// Audience identifier
    pub audience: String,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(1),
            issuer: "homedrive".to_string(),
            audience: "homedrive".to_string(),
        }
    }
}

/// A freshly minted token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies session tokens with one process-wide secret
#[derive(Clone)]
pub struct SessionSigner {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionSigner {
    /// Create a new signer with the given configuration
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Session lifetime for new tokens
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Mint a token binding `user_id` to its namespace root
    pub fn issue(&self, user_id: &str, storage_root: &std::path::Path) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.config.ttl)
            .ok_or(AuthError::TokenGenerationFailed)?;

        let claims = SessionClaims {
            sub: user_id.to_string(),
            storage_root: storage_root.to_string_lossy().into_owned(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and extract its claims
    pub fn decode_claims(&self, token: &str) -> AuthResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AuthError::ExpiredCredential
                    }
                    _ => AuthError::InvalidCredential,
                }
            })?;

        // jsonwebtoken accepts exp == now; the session ends at exp.
        if token_data.claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::ExpiredCredential);
        }

        Ok(token_data.claims)
    }

    /// Verify a bearer token and produce the caller's identity context
    pub fn verify(&self, token: &str) -> AuthResult<IdentityContext> {
        let claims = self.decode_claims(token)?;
        if claims.sub.is_empty() || claims.storage_root.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        Ok(IdentityContext {
            user_id: claims.sub,
            storage_root: PathBuf::from(claims.storage_root),
        })
    }
}
