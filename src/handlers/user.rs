//! Caller introspection

use axum::Json;

use super::AuthenticatedUser;
use crate::models::MeResponse;

/// GET /me/ - Role and permissions of the authenticated caller
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse::from(&user))
}
