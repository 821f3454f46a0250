//! Data models for the Moni backend

mod loan;
mod user;

pub use loan::*;
pub use user::*;
