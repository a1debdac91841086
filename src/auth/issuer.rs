//! # Credential Issuer
//!
//! Login: directory check, namespace provisioning, token minting, audit.

use std::sync::Arc;

use super::directory::{Authenticator, DirectoryOutcome};
use super::errors::{AuthError, AuthResult};
use super::jwt::{IssuedToken, SessionSigner};
use crate::file_storage::namespace::{NamespaceManager, Provisioning};
use crate::observability::audit::{AuditAction, AuditRecorder};

/// A verified directory identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub distinguished_name: String,
}

/// Successful login result
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub token: IssuedToken,
}

/// Turns directory-verified credentials into session tokens
pub struct CredentialIssuer {
    directory: Arc<dyn Authenticator>,
    signer: SessionSigner,
    namespaces: NamespaceManager,
    audit: AuditRecorder,
}

impl CredentialIssuer {
    pub fn new(
        directory: Arc<dyn Authenticator>,
        signer: SessionSigner,
        namespaces: NamespaceManager,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            directory,
            signer,
            namespaces,
            audit,
        }
    }

    /// Authenticate `username` and issue a session token.
    ///
    /// Failed attempts are audited under the attempted username. The caller
    /// only ever sees a generic failure; the directory's reason is logged.
    pub fn login(&self, username: &str, password: &str) -> AuthResult<LoginOutcome> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let entry = match self.directory.authenticate(username, password) {
            DirectoryOutcome::Authenticated(entry) => entry,
            DirectoryOutcome::Rejected(reason) => {
                tracing::warn!(username, %reason, "directory rejected login");
                self.audit.record(AuditAction::FailedLogin, None, username);
                return Err(AuthError::AuthenticationFailure);
            }
        };

        let user_id = match entry.uid.filter(|uid| !uid.is_empty()) {
            Some(uid) => uid,
            None => {
                tracing::warn!(username, dn = %entry.dn, "directory entry has no uid");
                self.audit.record(AuditAction::FailedLogin, None, username);
                return Err(AuthError::IdentityIncomplete);
            }
        };

        let storage_root = match self.namespaces.namespace_root(&user_id) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!(username, error = %e, "uid unusable as namespace");
                self.audit.record(AuditAction::FailedLogin, None, username);
                return Err(AuthError::InvalidUserId);
            }
        };

        match self.namespaces.ensure_provisioned(&user_id) {
            Ok(Provisioning::Created) | Ok(Provisioning::AlreadyPresent) => {}
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "namespace provisioning failed");
                return Err(AuthError::StorageError(e.to_string()));
            }
        }

        let token = self.signer.issue(&user_id, &storage_root)?;
        self.audit.record(AuditAction::Login, None, &user_id);
        tracing::info!(user_id = %user_id, "login succeeded");

        Ok(LoginOutcome {
            identity: Identity {
                user_id,
                distinguished_name: entry.dn,
            },
            token,
        })
    }
}
