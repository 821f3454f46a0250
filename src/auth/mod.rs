//! Authentication for staff accounts
//!
//! - Username/password login with bcrypt-hashed passwords
//! - JWT access and refresh token generation and validation

mod jwt;
mod password;
mod service;

pub use jwt::{generate_token, verify_token, Claims, JwtError, TokenType};
pub use password::{hash_password, verify_password};
pub use service::{AuthError, AuthService};
