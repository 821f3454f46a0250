//! User route definitions

use axum::{routing::get, Router};

use crate::handlers::user::me;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/me/", get(me))
}
