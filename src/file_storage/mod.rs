//! # homedrive File Storage Module
//!
//! Per-user namespaces on the local filesystem and the gateway that scopes
//! every file operation to the caller's own namespace.

pub mod errors;
pub mod namespace;
pub mod gateway;

pub use errors::{StorageError, StorageResult};
pub use namespace::{NamespaceManager, Provisioning};
pub use gateway::{Download, FileGateway};
