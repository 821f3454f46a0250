//! Token HTTP handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::error::ApiResult;
use crate::models::{AccessTokenResponse, RefreshTokenRequest, TokenPairResponse, TokenRequest};
use crate::state::AppState;

/// POST /token/ - Exchange credentials for an access/refresh token pair
pub async fn obtain_token(
    State(state): State<AppState>,
    req: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPairResponse>> {
    let Json(req) = req?;
    let tokens = state
        .auth_service
        .obtain_tokens(&req.username, &req.password)
        .await?;
    Ok(Json(tokens))
}

/// POST /token/refresh/ - Issue a new access token from a refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    req: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> ApiResult<Json<AccessTokenResponse>> {
    let Json(req) = req?;
    Ok(Json(state.auth_service.refresh(&req.refresh).await?))
}
