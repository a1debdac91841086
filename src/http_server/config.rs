//! Server Configuration
//!
//! Host, port, CORS, storage and session settings, loaded from a JSON file.
//! Every field has a default, so `{}` is a valid configuration. The signing
//! secret is deliberately not part of the file; it comes from
//! [`SECRET_ENV`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the token signing secret
pub const SECRET_ENV: &str = "HOMEDRIVE_JWT_SECRET";

/// Longest accepted session lifetime (30 days)
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Configuration load/validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 3001)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty means any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Directory holding one namespace per user (default: "home")
    #[serde(default = "default_storage_base")]
    pub storage_base: PathBuf,

    /// Audit log file (default: "logs/audit.log")
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,

    /// Suffix audit lines with a SHA-256 hash chain
    #[serde(default)]
    pub audit_hash_chain: bool,

    /// Session lifetime in seconds (default: 3600)
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Token issuer claim
    #[serde(default = "default_token_party")]
    pub token_issuer: String,

    /// Token audience claim
    #[serde(default = "default_token_party")]
    pub token_audience: String,

    /// JSON file with directory entries (default: "directory.json")
    #[serde(default = "default_directory_file")]
    pub directory_file: PathBuf,

    /// Largest accepted upload in bytes (default: 100 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn default_storage_base() -> PathBuf {
    PathBuf::from("home")
}

fn default_audit_log() -> PathBuf {
    PathBuf::from("logs/audit.log")
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_token_party() -> String {
    "homedrive".to_string()
}

fn default_directory_file() -> PathBuf {
    PathBuf::from("directory.json")
}

fn default_max_upload_bytes() -> u64 {
    crate::file_storage::gateway::DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            storage_base: default_storage_base(),
            audit_log: default_audit_log(),
            audit_hash_chain: false,
            token_ttl_secs: default_token_ttl_secs(),
            token_issuer: default_token_party(),
            token_audience: default_token_party(),
            directory_file: default_directory_file(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let config: ServerConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid("token_ttl_secs must be > 0".to_string()));
        }
        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "token_ttl_secs must be <= {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be > 0".to_string()));
        }
        if self.storage_base.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage_base must not be empty".to_string()));
        }
        if self.audit_log.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("audit_log must not be empty".to_string()));
        }
        Ok(())
    }

    /// Create a default config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
