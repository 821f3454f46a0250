//! Health route

use axum::{routing::get, Router};
use sqlx::PgPool;

use crate::handlers::health::health_check;

pub fn health_routes<S>(pool: PgPool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .with_state(pool)
}
