//! Centralized API error handling
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses. Field validation
//! failures are rendered as a map of field name to messages.

use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::loan_service::LoanError;
use crate::policy::PermissionDenied;
use crate::store::StoreError;

/// Key used for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Per-field validation messages, e.g. `{"email": ["Enter a valid email address."]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(value)` when no errors were collected
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors = FieldErrors::default();
        for (field, field_errors) in err.field_errors() {
            for e in field_errors {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", e.code));
                errors.add(field, message);
            }
        }
        errors
    }
}

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// `POST` on a collection that does not accept creation; empty body
    #[error("Creation not allowed")]
    CreationNotAllowed,

    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// JSON body for non-field errors
#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("No LoanRequest matches the given query.".to_string())
    }

    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::CreationNotAllowed => "BAD_REQUEST",
            ApiError::Unauthorized { code, .. } => *code,
            ApiError::Forbidden(_) => "PERMISSION_DENIED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::CreationNotAllowed => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, code = %error_code, "Server error occurred");
        } else {
            tracing::debug!(error = %message, code = %error_code, "Client error occurred");
        }

        match self {
            ApiError::Validation(errors) => (status, Json(errors)).into_response(),
            ApiError::CreationNotAllowed => status.into_response(),
            ApiError::Unauthorized { code, message } => {
                let mut response = (
                    status,
                    Json(ErrorResponse {
                        detail: message,
                        code: Some(code.to_string()),
                    }),
                )
                    .into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer realm=\"api\""),
                );
                response
            }
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => (
                status,
                Json(ErrorResponse {
                    detail: "A server error occurred.".to_string(),
                    code: None,
                }),
            )
                .into_response(),
            other => (
                status,
                Json(ErrorResponse {
                    detail: other.to_string(),
                    code: None,
                }),
            )
                .into_response(),
        }
    }
}

// Convenience conversions from common error types

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIdNumber => ApiError::Validation(FieldErrors::single(
                "id_number",
                "loan request with this id number already exists.",
            )),
            StoreError::NotFound => ApiError::not_found(),
            StoreError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::unauthorized("NO_ACTIVE_ACCOUNT", err.to_string())
            }
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::WrongTokenType
            | AuthError::UserNotFound => {
                ApiError::unauthorized("TOKEN_NOT_VALID", "Given token not valid for any token type")
            }
            AuthError::TokenError(msg) => ApiError::InternalError(msg),
            AuthError::Store(e) => ApiError::from(e),
        }
    }
}

impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::Validation(errors) => ApiError::Validation(errors),
            LoanError::NotFound(_) => ApiError::not_found(),
            LoanError::Store(e) => ApiError::from(e),
        }
    }
}

impl From<PermissionDenied> for ApiError {
    fn from(err: PermissionDenied) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(FieldErrors::single(
            NON_FIELD_ERRORS,
            rejection.body_text(),
        ))
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
