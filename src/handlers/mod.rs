//! API handlers for the Moni backend

pub mod auth;
pub mod health;
pub mod loan;
pub mod user;

pub use crate::middleware::auth::AuthenticatedUser;
