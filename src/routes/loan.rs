//! Loan route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::loan;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/loan-requests/", post(loan::submit_loan_request))
        .route(
            "/admin/loans/",
            get(loan::list_loans).post(loan::create_loan),
        )
        .route(
            "/admin/loans/:id/",
            get(loan::get_loan)
                .put(loan::update_loan)
                .patch(loan::partial_update_loan)
                .delete(loan::delete_loan),
        )
        .route("/admin/loans/:id/approve/", post(loan::approve_loan))
        .route("/admin/loans/:id/reject/", post(loan::reject_loan))
}
