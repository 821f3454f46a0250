//! Staff account models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::policy;

/// Staff role attached to an account
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    Admin,
    Analyst,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Analyst => "Analyst",
        }
    }
}

/// Staff account
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub role: Option<UserRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for creating an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub role: Option<UserRole>,
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Response of `GET /me/`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MeResponse {
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub groups: Vec<String>,
    pub permissions: Vec<String>,
}

impl From<&User> for MeResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            is_staff: user.is_staff,
            groups: user.role.iter().map(|r| r.as_str().to_string()).collect(),
            permissions: policy::permissions_for(user.role)
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Body of `POST /token/`
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// Response of `POST /token/`
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Body of `POST /token/refresh/`
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh: String,
}

/// Response of `POST /token/refresh/`
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}
