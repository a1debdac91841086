//! CLI module for homedrive
//!
//! Provides command-line interface for:
//! - serve: Load configuration and run the HTTP server
//! - hash-password: Produce Argon2id hashes for directory files
//! - verify-audit: Check the audit log hash chain

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{hash_password, resolve_secret, run, run_command, serve, verify_audit};
pub use errors::{CliError, CliErrorCode, CliResult};
