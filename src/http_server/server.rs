//! # HTTP Server
//!
//! Shared state, router assembly and the listener loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::Request, routing::get, Json, Router};
use chrono::Duration;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::auth_routes::auth_routes;
use super::config::ServerConfig;
use super::file_routes::file_routes;
use crate::auth::directory::Authenticator;
use crate::auth::issuer::CredentialIssuer;
use crate::auth::jwt::{SessionSigner, TokenConfig};
use crate::file_storage::gateway::FileGateway;
use crate::file_storage::namespace::NamespaceManager;
use crate::observability::audit::{AuditLog, AuditRecorder, FileAuditLog};

/// Components shared by every handler
pub struct AppState {
    pub issuer: CredentialIssuer,
    pub signer: SessionSigner,
    pub gateway: FileGateway,
}

impl AppState {
    /// Wire components together from explicit configuration
    pub fn new(
        config: &ServerConfig,
        secret: String,
        directory: Arc<dyn Authenticator>,
        audit_log: Arc<dyn AuditLog>,
    ) -> Self {
        let ttl = i64::try_from(config.token_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::hours(1));
        let signer = SessionSigner::new(TokenConfig {
            secret,
            ttl,
            issuer: config.token_issuer.clone(),
            audience: config.token_audience.clone(),
        });
        let namespaces = NamespaceManager::new(config.storage_base.clone());
        let audit = AuditRecorder::new(audit_log);

        Self {
            issuer: CredentialIssuer::new(
                directory,
                signer.clone(),
                namespaces.clone(),
                audit.clone(),
            ),
            signer,
            gateway: FileGateway::new(namespaces, audit)
                .with_max_upload_bytes(config.max_upload_bytes),
        }
    }

    /// Same as [`AppState::new`], auditing to the configured file
    pub fn with_file_audit(
        config: &ServerConfig,
        secret: String,
        directory: Arc<dyn Authenticator>,
    ) -> Self {
        let audit_log =
            FileAuditLog::new(&config.audit_log).with_hash_chain(config.audit_hash_chain);
        Self::new(config, secret, directory, Arc::new(audit_log))
    }
}

/// HTTP Server for homedrive
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server around already-built state
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        let router = build_router(&config, state);
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "homedrive listening");
        tracing::info!(
            storage_base = %self.config.storage_base.display(),
            audit_log = %self.config.audit_log.display(),
            "storage configured"
        );

        axum::serve(listener, self.router).await
    }
}

/// Build the combined router with all endpoints
pub fn build_router(config: &ServerConfig, state: Arc<AppState>) -> Router {
    // Configure CORS from config
    let cors = if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(health_handler))
        .merge(auth_routes(state.clone()))
        .merge(file_routes(state))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri().path(),
                )
            }),
        )
        .layer(cors)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
