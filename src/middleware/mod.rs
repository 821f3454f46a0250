//! Middleware for the Moni API
//!
//! This module provides request tracing, security headers, and the
//! authentication extractor.

pub mod auth;
mod security;
mod tracing;

pub use auth::AuthenticatedUser;
pub use security::security_headers;
pub use tracing::request_tracing;
