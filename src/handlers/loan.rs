//! Loan request handlers
//!
//! `POST /loan-requests/` is public. Everything under `/admin/loans/` requires
//! an authenticated staff account and is gated by the role policy before any
//! record is touched.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use super::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::loan_service::UpdateMode;
use crate::models::{LoanApplicationPayload, LoanRequest, LoanUpdatePayload};
use crate::policy::LoanAction;
use crate::state::AppState;

/// Unparseable ids cannot match a record
fn parse_loan_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>().map_err(|_| ApiError::not_found())
}

/// POST /loan-requests/ - Submit a loan application
pub async fn submit_loan_request(
    State(state): State<AppState>,
    payload: Result<Json<LoanApplicationPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LoanRequest>)> {
    let Json(payload) = payload?;
    let loan = state.loan_service.submit(payload).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// GET /admin/loans/
pub async fn list_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<LoanRequest>>> {
    user.authorize(LoanAction::List)?;
    Ok(Json(state.loan_service.list().await?))
}

/// GET /admin/loans/:id/
pub async fn get_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<LoanRequest>> {
    user.authorize(LoanAction::Retrieve)?;
    let id = parse_loan_id(&id)?;
    Ok(Json(state.loan_service.get(id).await?))
}

/// POST /admin/loans/ - Loan requests are only created through the public endpoint
pub async fn create_loan(user: AuthenticatedUser) -> ApiResult<StatusCode> {
    user.authorize(LoanAction::Create)?;
    Err(ApiError::CreationNotAllowed)
}

/// PUT /admin/loans/:id/
pub async fn update_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    payload: Result<Json<LoanUpdatePayload>, JsonRejection>,
) -> ApiResult<Json<LoanRequest>> {
    user.authorize(LoanAction::Update)?;
    apply_update(&state, &id, payload, UpdateMode::Full).await
}

/// PATCH /admin/loans/:id/
pub async fn partial_update_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    payload: Result<Json<LoanUpdatePayload>, JsonRejection>,
) -> ApiResult<Json<LoanRequest>> {
    user.authorize(LoanAction::PartialUpdate)?;
    apply_update(&state, &id, payload, UpdateMode::Partial).await
}

async fn apply_update(
    state: &AppState,
    id: &str,
    payload: Result<Json<LoanUpdatePayload>, JsonRejection>,
    mode: UpdateMode,
) -> ApiResult<Json<LoanRequest>> {
    let id = parse_loan_id(id)?;
    let Json(payload) = payload?;
    Ok(Json(state.loan_service.update(id, payload, mode).await?))
}

/// DELETE /admin/loans/:id/
pub async fn delete_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.authorize(LoanAction::Delete)?;
    state.loan_service.delete(parse_loan_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/loans/:id/approve/
pub async fn approve_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.authorize(LoanAction::Approve)?;
    state.loan_service.approve(parse_loan_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/loans/:id/reject/
pub async fn reject_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.authorize(LoanAction::Reject)?;
    state.loan_service.reject(parse_loan_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
