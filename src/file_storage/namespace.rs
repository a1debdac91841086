//! # Storage Namespaces
//!
//! One directory per user under a fixed base:
//!
//! ```text
//! <base>/<user_id>/README.txt
//! <base>/<user_id>/uploads/<stored files>
//! ```
//!
//! ## Invariants
//! - The namespace root is derived from `user_id` alone
//! - `user_id` is a single path segment, so distinct ids never share a root
//! - Resolved file paths are always direct children of `uploads/`

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::errors::{StorageError, StorageResult};

/// Subdirectory holding user files
pub const UPLOADS_DIR: &str = "uploads";

/// Informational file written on first provisioning
pub const SEED_FILE: &str = "README.txt";

const SEED_CONTENT: &str = "Welcome to your personal storage area.\n\
Files you upload are kept in the uploads directory and are visible only to you.\n";

fn user_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._@-]+$").expect("static pattern"))
}

/// Outcome of [`NamespaceManager::ensure_provisioned`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioning {
    Created,
    AlreadyPresent,
}

/// Maps user ids to their isolated storage roots
#[derive(Debug, Clone)]
pub struct NamespaceManager {
    base: PathBuf,
}

impl NamespaceManager {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory under which all namespaces live
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Root directory of `user_id`'s namespace
    pub fn namespace_root(&self, user_id: &str) -> StorageResult<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.base.join(user_id))
    }

    /// The `uploads` directory of `user_id`'s namespace
    pub fn uploads_dir(&self, user_id: &str) -> StorageResult<PathBuf> {
        Ok(self.namespace_root(user_id)?.join(UPLOADS_DIR))
    }

    /// Create the namespace if its root directory does not exist yet.
    ///
    /// Not atomic: a root left behind by an interrupted first call counts as
    /// provisioned, and its seed file is not written again.
    pub fn ensure_provisioned(&self, user_id: &str) -> StorageResult<Provisioning> {
        let root = self.namespace_root(user_id)?;
        if root.is_dir() {
            return Ok(Provisioning::AlreadyPresent);
        }

        fs::create_dir_all(root.join(UPLOADS_DIR))
            .map_err(|e| StorageError::WriteFailure(format!("{}: {}", root.display(), e)))?;
        fs::write(root.join(SEED_FILE), SEED_CONTENT)
            .map_err(|e| StorageError::WriteFailure(format!("{}: {}", root.display(), e)))?;

        tracing::info!(user_id, root = %root.display(), "namespace provisioned");
        Ok(Provisioning::Created)
    }

    /// Path of `filename` inside `user_id`'s uploads directory
    pub fn resolve(&self, user_id: &str, filename: &str) -> StorageResult<PathBuf> {
        validate_filename(filename)?;
        Ok(self.uploads_dir(user_id)?.join(filename))
    }
}

/// Check that `user_id` is usable as exactly one directory name
pub fn validate_user_id(user_id: &str) -> StorageResult<()> {
    if user_id == "." || user_id == ".." || !user_id_pattern().is_match(user_id) {
        return Err(StorageError::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}

/// Check that `filename` names a direct child of a directory
pub fn validate_filename(filename: &str) -> StorageResult<()> {
    let invalid = || StorageError::InvalidFilename(filename.to_string());

    if filename.is_empty()
        || filename.contains(&['/', '\\', '\0'][..])
        || filename == "."
        || filename == ".."
    {
        return Err(invalid());
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == filename => Ok(()),
        _ => Err(invalid()),
    }
}
