//! Route definitions for the Moni API

mod auth;
mod health;
mod loan;
mod user;

pub use auth::auth_routes;
pub use health::health_routes;
pub use loan::loan_routes;
pub use user::user_routes;
