//! Observability for homedrive
//!
//! - Diagnostic logging through `tracing`, configured once at startup
//! - The security audit trail ([`audit`]), which is a separate,
//!   append-only record and never goes through the diagnostic logger

pub mod audit;

pub use audit::{
    verify_chain, AuditAction, AuditEntry, AuditLog, AuditRecorder, ChainVerification,
    FileAuditLog, MemoryAuditLog,
};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling this twice is harmless.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=info,tower_http=info,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
