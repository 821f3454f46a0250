//! Role-based authorization for loan administration
//!
//! Read-class actions (list, retrieve) are open to Analysts and Admins.
//! Everything else is Admin only. An identity without a role is denied.

use thiserror::Error;

use crate::models::UserRole;

pub const VIEW_LOAN: &str = "auth.view_loan";
pub const UPDATE_LOAN: &str = "auth.update_loan";

/// Actions on the administrative loan collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Delete,
    Approve,
    Reject,
}

impl LoanAction {
    pub const ALL: [LoanAction; 8] = [
        LoanAction::List,
        LoanAction::Retrieve,
        LoanAction::Create,
        LoanAction::Update,
        LoanAction::PartialUpdate,
        LoanAction::Delete,
        LoanAction::Approve,
        LoanAction::Reject,
    ];

    pub fn is_read(&self) -> bool {
        matches!(self, LoanAction::List | LoanAction::Retrieve)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("You do not have permission to perform this action.")]
pub struct PermissionDenied;

/// Decide whether `role` may perform `action`
pub fn authorize(role: Option<UserRole>, action: LoanAction) -> Result<(), PermissionDenied> {
    let allowed = match (role, action.is_read()) {
        (Some(UserRole::Admin), _) => true,
        (Some(UserRole::Analyst), true) => true,
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(PermissionDenied)
    }
}

/// Permission codes granted to a role
pub fn permissions_for(role: Option<UserRole>) -> &'static [&'static str] {
    match role {
        Some(UserRole::Admin) => &[VIEW_LOAN, UPDATE_LOAN],
        Some(UserRole::Analyst) => &[VIEW_LOAN],
        None => &[],
    }
}
