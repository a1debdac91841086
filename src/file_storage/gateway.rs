//! # File Access Gateway
//!
//! List, upload, download, view and delete, always inside the caller's own
//! `uploads` directory. Paths come only from [`NamespaceManager`]; the
//! identity context is the sole source of the owner.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use chrono::Utc;

use super::errors::{StorageError, StorageResult};
use super::namespace::{validate_filename, NamespaceManager};
use crate::auth::jwt::IdentityContext;
use crate::observability::audit::{AuditAction, AuditRecorder};

/// Default upload size cap (100 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// An opened stored file, ready to stream
#[derive(Debug)]
pub struct Download {
    pub stored_name: String,
    pub file: File,
    pub size: u64,
}

/// Per-user file operations
#[derive(Clone)]
pub struct FileGateway {
    namespaces: NamespaceManager,
    audit: AuditRecorder,
    max_upload_bytes: u64,
}

impl FileGateway {
    pub fn new(namespaces: NamespaceManager, audit: AuditRecorder) -> Self {
        Self {
            namespaces,
            audit,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// The token's storage root must be the one derived from its user id.
    fn check_scope(&self, ctx: &IdentityContext) -> StorageResult<()> {
        let root = self.namespaces.namespace_root(&ctx.user_id)?;
        if root != ctx.storage_root {
            tracing::warn!(
                user_id = %ctx.user_id,
                claimed = %ctx.storage_root.display(),
                "storage root does not match namespace"
            );
            return Err(StorageError::Forbidden);
        }
        Ok(())
    }

    /// Stored filenames in the caller's uploads directory, sorted
    pub fn list(&self, ctx: &IdentityContext) -> StorageResult<Vec<String>> {
        self.check_scope(ctx)?;
        let dir = self.namespaces.uploads_dir(&ctx.user_id)?;

        let entries = fs::read_dir(&dir)
            .map_err(|e| StorageError::StorageUnavailable(format!("{}: {}", dir.display(), e)))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| StorageError::StorageUnavailable(format!("{}: {}", dir.display(), e)))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Store `data` as `<epoch-millis>-<original_name>`; returns the stored name
    pub fn upload(
        &self,
        ctx: &IdentityContext,
        original_name: &str,
        data: &[u8],
    ) -> StorageResult<String> {
        let result = self.store(ctx, original_name, data);
        let target = result.as_deref().unwrap_or(original_name);
        self.record(AuditAction::Upload, target, ctx, &result);
        result
    }

    /// Open a stored file for streaming as an attachment
    pub fn download(&self, ctx: &IdentityContext, filename: &str) -> StorageResult<Download> {
        let result = self.open(ctx, filename);
        self.record(AuditAction::Download, filename, ctx, &result);
        result
    }

    /// Read a stored file as text (invalid UTF-8 is replaced)
    pub fn view(&self, ctx: &IdentityContext, filename: &str) -> StorageResult<String> {
        let result = self.read_text(ctx, filename);
        self.record(AuditAction::View, filename, ctx, &result);
        result
    }

    /// Remove a stored file
    pub fn delete(&self, ctx: &IdentityContext, filename: &str) -> StorageResult<()> {
        let result = self.remove(ctx, filename);
        self.record(AuditAction::Delete, filename, ctx, &result);
        result
    }

    /// Attempts are audited whether or not they succeed.
    fn record<T>(
        &self,
        action: AuditAction,
        filename: &str,
        ctx: &IdentityContext,
        result: &StorageResult<T>,
    ) {
        if let Err(e) = result {
            tracing::debug!(
                user_id = %ctx.user_id,
                %action,
                filename,
                error = %e,
                "file operation refused"
            );
        }
        self.audit.record(action, Some(filename), &ctx.user_id);
    }

    fn store(
        &self,
        ctx: &IdentityContext,
        original_name: &str,
        data: &[u8],
    ) -> StorageResult<String> {
        self.check_scope(ctx)?;
        validate_filename(original_name)?;

        let size = data.len() as u64;
        if size > self.max_upload_bytes {
            return Err(StorageError::FileTooLarge(size, self.max_upload_bytes));
        }

        let stored_name = format!("{}-{}", Utc::now().timestamp_millis(), original_name);
        let path = self.namespaces.resolve(&ctx.user_id, &stored_name)?;
        fs::write(&path, data)
            .map_err(|e| StorageError::WriteFailure(format!("{}: {}", path.display(), e)))?;
        Ok(stored_name)
    }

    fn open(&self, ctx: &IdentityContext, filename: &str) -> StorageResult<Download> {
        self.check_scope(ctx)?;
        let path = self.namespaces.resolve(&ctx.user_id, filename)?;

        let file = File::open(&path).map_err(|e| map_read_error(e, filename, &path))?;
        let metadata = file
            .metadata()
            .map_err(|e| map_read_error(e, filename, &path))?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(filename.to_string()));
        }

        Ok(Download {
            stored_name: filename.to_string(),
            file,
            size: metadata.len(),
        })
    }

    fn read_text(&self, ctx: &IdentityContext, filename: &str) -> StorageResult<String> {
        self.check_scope(ctx)?;
        let path = self.namespaces.resolve(&ctx.user_id, filename)?;

        if path.is_dir() {
            return Err(StorageError::NotFound(filename.to_string()));
        }
        let data = fs::read(&path).map_err(|e| map_read_error(e, filename, &path))?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn remove(&self, ctx: &IdentityContext, filename: &str) -> StorageResult<()> {
        self.check_scope(ctx)?;
        let path = self.namespaces.resolve(&ctx.user_id, filename)?;
        fs::remove_file(&path).map_err(|e| map_read_error(e, filename, &path))
    }
}

fn map_read_error(e: io::Error, filename: &str, path: &Path) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(filename.to_string())
    } else {
        StorageError::StorageUnavailable(format!("{}: {}", path.display(), e))
    }
}
