//! # File Storage Errors

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    // Validation errors
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),

    // Object errors
    #[error("File not found: {0}")]
    NotFound(String),

    // Permission errors
    #[error("Forbidden")]
    Forbidden,

    // I/O errors
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Write failed: {0}")]
    WriteFailure(String),
}

impl StorageError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::InvalidFilename(_) => 400,
            StorageError::InvalidUserId(_) => 400,
            StorageError::FileTooLarge(_, _) => 413,
            StorageError::NotFound(_) => 404,
            StorageError::Forbidden => 403,
            StorageError::StorageUnavailable(_) => 500,
            StorageError::WriteFailure(_) => 500,
        }
    }

    /// Message safe to return to the caller
    ///
    /// I/O failures are reported generically; the detail goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            StorageError::StorageUnavailable(_) => "Storage unavailable".to_string(),
            StorageError::WriteFailure(_) => "Failed to write file".to_string(),
            other => other.to_string(),
        }
    }
}
