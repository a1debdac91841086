//! # Directory Capability
//!
//! The identity provider behind login. Anything that can answer
//! "are these credentials good, and who is this" implements [`Authenticator`];
//! the protocol spoken to the real directory is not this crate's concern.
//!
//! [`StaticDirectory`] is the bundled provider: a JSON file of entries with
//! Argon2id password hashes, also used in tests.

use std::path::Path;
use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};

use super::crypto::{hash_password, verify_password};
use super::errors::{AuthError, AuthResult};

/// Attributes returned by the directory for an authenticated bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name of the entry
    pub dn: String,

    /// `uid` attribute, if the entry carries one
    pub uid: Option<String>,
}

/// Result of asking the directory about a credential pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryOutcome {
    /// Credentials accepted
    Authenticated(DirectoryEntry),

    /// Credentials refused; reason is for logs only
    Rejected(String),
}

/// Identity provider capability
pub trait Authenticator: Send + Sync {
    /// Check a username/password pair against the directory
    fn authenticate(&self, username: &str, password: &str) -> DirectoryOutcome;
}

/// One entry of a static directory file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    pub dn: String,

    /// Argon2id PHC string
    pub password_hash: String,
}

/// File-backed directory with Argon2id hashed passwords
#[derive(Debug, Default)]
pub struct StaticDirectory {
    records: RwLock<Vec<DirectoryRecord>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-loaded records
    pub fn from_records(records: Vec<DirectoryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Load a JSON array of [`DirectoryRecord`]s
    pub fn load(path: &Path) -> AuthResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuthError::DirectoryError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let records: Vec<DirectoryRecord> = serde_json::from_str(&content).map_err(|e| {
            AuthError::DirectoryError(format!("cannot parse {}: {}", path.display(), e))
        })?;
        Ok(Self::from_records(records))
    }

    /// Add an entry, hashing the given password
    pub fn add_user(&self, username: &str, uid: Option<&str>, password: &str) -> AuthResult<()> {
        let record = DirectoryRecord {
            username: username.to_string(),
            uid: uid.map(str::to_string),
            dn: format!("uid={},ou=people,dc=homedrive", username),
            password_hash: hash_password(password)?,
        };

        let mut records = self
            .records
            .write()
            .map_err(|_| AuthError::DirectoryError("Lock poisoned".to_string()))?;
        records.retain(|r| r.username != username);
        records.push(record);
        Ok(())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash verified for unknown usernames, so they cost as much as a wrong password
fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| hash_password("homedrive-decoy").unwrap_or_default())
}

/// The hash a login attempt is checked against
fn credential_hash(record: Option<&DirectoryRecord>) -> &str {
    match record {
        Some(record) => &record.password_hash,
        None => decoy_hash(),
    }
}

impl Authenticator for StaticDirectory {
    fn authenticate(&self, username: &str, password: &str) -> DirectoryOutcome {
        let record = match self.records.read() {
            Ok(records) => records.iter().find(|r| r.username == username).cloned(),
            Err(_) => return DirectoryOutcome::Rejected("directory unavailable".to_string()),
        };

        let verified = verify_password(password, credential_hash(record.as_ref()));
        match record {
            None => DirectoryOutcome::Rejected("no such entry".to_string()),
            Some(record) if verified => DirectoryOutcome::Authenticated(DirectoryEntry {
                dn: record.dn,
                uid: record.uid,
            }),
            Some(_) => DirectoryOutcome::Rejected("bind failed".to_string()),
        }
    }
}
