//! homedrive - directory-authenticated personal file storage
//!
//! Users sign in against a directory, receive a short-lived signed session
//! token and manage files inside a private namespace on local disk. Every
//! successful login and file mutation is written to an append-only audit log.

pub mod auth;
pub mod cli;
pub mod file_storage;
pub mod http_server;
pub mod observability;
