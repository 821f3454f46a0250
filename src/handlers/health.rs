//! Health check

use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::db;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: String,
    version: &'static str,
}

/// GET /health
pub async fn health_check(State(pool): State<PgPool>) -> Json<HealthResponse> {
    let (status, database) = match db::ping(&pool).await {
        Ok(()) => ("healthy", "connected".to_string()),
        Err(e) => ("unhealthy", format!("error: {}", e)),
    };

    Json(HealthResponse {
        status,
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}
