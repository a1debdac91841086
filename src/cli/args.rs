//! CLI argument definitions using clap
//!
//! Commands:
//! - homedrive serve --config <path> [--port <port>]
//! - homedrive hash-password <password>
//! - homedrive verify-audit --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// homedrive - directory-authenticated personal file storage
#[derive(Parser, Debug)]
#[command(name = "homedrive")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./homedrive.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print an Argon2id hash for a directory file entry
    HashPassword {
        /// Password to hash
        password: String,
    },

    /// Check the hash chain of the configured audit log
    VerifyAudit {
        /// Path to configuration file
        #[arg(long, default_value = "./homedrive.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
