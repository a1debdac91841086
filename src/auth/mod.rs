//! # homedrive Auth Module
//!
//! Directory-backed login, signed session tokens, and their verification.

pub mod errors;
pub mod crypto;
pub mod directory;
pub mod jwt;
pub mod issuer;

pub use errors::{AuthError, AuthResult};
pub use directory::{Authenticator, DirectoryEntry, DirectoryOutcome, StaticDirectory};
pub use jwt::{IdentityContext, IssuedToken, SessionSigner, TokenConfig};
pub use issuer::{CredentialIssuer, Identity, LoginOutcome};
