//! Authentication extractor
//!
//! Verifies the bearer token from the Authorization header and resolves the
//! staff account behind it.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::models::{User, UserRole};
use crate::policy::{self, LoanAction};

/// Authenticated staff account extracted from a JWT access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn role(&self) -> Option<UserRole> {
        self.0.role
    }

    /// Check the role policy for `action`
    pub fn authorize(&self, action: LoanAction) -> Result<(), ApiError> {
        policy::authorize(self.role(), action).map_err(|denied| {
            tracing::warn!(
                username = %self.0.username,
                action = ?action,
                "Permission denied"
            );
            ApiError::from(denied)
        })
    }
}

/// Extractor for authenticated users
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", user.0.username)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::unauthorized(
                        "NOT_AUTHENTICATED",
                        "Authentication credentials were not provided.",
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let user = auth_service.authenticate(bearer.token()).await?;

        Ok(AuthenticatedUser(user))
    }
}
