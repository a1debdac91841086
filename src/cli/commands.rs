//! CLI command implementations
//!
//! `serve` is the only long-running command. It loads configuration, the
//! user directory and the signing secret, then hands everything to the
//! HTTP server on a fresh tokio runtime.

use std::path::Path;
use std::sync::Arc;

use crate::auth::crypto;
use crate::auth::directory::StaticDirectory;
use crate::http_server::{AppState, HttpServer, ServerConfig, SECRET_ENV};
use crate::observability::{init_logging, verify_chain, ChainVerification};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
            Ok(())
        }
        Command::VerifyAudit { config } => {
            let lines = verify_audit(&config)?;
            println!("audit log intact ({} lines)", lines);
            Ok(())
        }
    }
}

/// Load config and directory, then run the HTTP server until it stops
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    init_logging();

    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }

    let directory = StaticDirectory::load(&config.directory_file)?;
    if directory.is_empty() {
        tracing::warn!(
            path = %config.directory_file.display(),
            "directory has no users; every login will fail"
        );
    }

    let secret = resolve_secret(std::env::var(SECRET_ENV).ok());
    let state = Arc::new(AppState::with_file_audit(
        &config,
        secret,
        Arc::new(directory),
    ));
    let server = HttpServer::new(config, state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Argon2id hash suitable for a directory file `password_hash`
pub fn hash_password(password: &str) -> CliResult<String> {
    if password.is_empty() {
        return Err(CliError::config_error("password must not be empty"));
    }
    Ok(crypto::hash_password(password)?)
}

/// Check the configured audit log's hash chain, returning its line count
pub fn verify_audit(config_path: &Path) -> CliResult<usize> {
    let config = load_config(config_path)?;
    match verify_chain(&config.audit_log)? {
        ChainVerification::Intact { lines } => Ok(lines),
        ChainVerification::Broken { line } => Err(CliError::audit_broken(line)),
    }
}

/// Use the configured secret, or generate one valid for this process only
pub fn resolve_secret(configured: Option<String>) -> String {
    match configured {
        Some(secret) if !secret.trim().is_empty() => secret,
        _ => {
            tracing::warn!(
                "{} is not set; using a random secret, sessions will not survive a restart",
                SECRET_ENV
            );
            crypto::generate_secret()
        }
    }
}

fn load_config(path: &Path) -> CliResult<ServerConfig> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(ServerConfig::default());
    }
    Ok(ServerConfig::load(path)?)
}
