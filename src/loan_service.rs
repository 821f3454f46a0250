//! Loan service layer - Business logic for the loan request lifecycle

use std::sync::Arc;

use thiserror::Error;

use crate::eligibility::EligibilityChecker;
use crate::error::FieldErrors;
use crate::models::{
    LoanApplicationPayload, LoanChanges, LoanRequest, LoanStatus, LoanUpdatePayload,
    NewLoanRequest,
};
use crate::store::{LoanStore, StoreError};

const DUPLICATE_ID_NUMBER: &str = "loan request with this id number already exists.";

/// Loan service errors
#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Loan request {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Store(StoreError),
}

impl From<FieldErrors> for LoanError {
    fn from(errors: FieldErrors) -> Self {
        LoanError::Validation(errors)
    }
}

impl From<StoreError> for LoanError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIdNumber => LoanError::Validation(FieldErrors::single(
                "id_number",
                DUPLICATE_ID_NUMBER,
            )),
            other => LoanError::Store(other),
        }
    }
}

/// How much of a loan request an update must supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Full,
    Partial,
}

/// Loan service for managing the loan request lifecycle
#[derive(Clone)]
pub struct LoanService {
    store: Arc<dyn LoanStore>,
    eligibility: Arc<dyn EligibilityChecker>,
}

impl LoanService {
    pub fn new(store: Arc<dyn LoanStore>, eligibility: Arc<dyn EligibilityChecker>) -> Self {
        Self { store, eligibility }
    }

    /// Validate a public submission, ask the eligibility service for a
    /// decision and persist the request with the resulting status.
    ///
    /// Nothing is written when validation fails.
    pub async fn submit(&self, payload: LoanApplicationPayload) -> Result<LoanRequest, LoanError> {
        let application = payload.into_checked()?;

        if self
            .store
            .id_number_taken(&application.id_number, None)
            .await?
        {
            return Err(FieldErrors::single("id_number", DUPLICATE_ID_NUMBER).into());
        }

        let eligible = self
            .eligibility
            .check_eligibility(&application.id_number)
            .await;
        let status = LoanStatus::from_eligibility(eligible);

        let loan = self
            .store
            .insert(NewLoanRequest {
                status,
                ..application
            })
            .await?;

        tracing::info!(loan_id = loan.id, status = %loan.status, "Loan request submitted");

        Ok(loan)
    }

    /// List all loan requests
    pub async fn list(&self) -> Result<Vec<LoanRequest>, LoanError> {
        Ok(self.store.list().await?)
    }

    /// Get a loan request by ID
    pub async fn get(&self, id: i64) -> Result<LoanRequest, LoanError> {
        self.store.get(id).await?.ok_or(LoanError::NotFound(id))
    }

    /// Apply an administrative update. `status` may be changed here as well.
    pub async fn update(
        &self,
        id: i64,
        payload: LoanUpdatePayload,
        mode: UpdateMode,
    ) -> Result<LoanRequest, LoanError> {
        self.get(id).await?;

        let changes = match mode {
            UpdateMode::Full => payload.into_full_changes()?,
            UpdateMode::Partial => payload.into_partial_changes()?,
        };

        if let Some(id_number) = &changes.id_number {
            if self.store.id_number_taken(id_number, Some(id)).await? {
                return Err(FieldErrors::single("id_number", DUPLICATE_ID_NUMBER).into());
            }
        }

        let loan = self.apply(id, changes).await?;
        tracing::info!(loan_id = loan.id, status = %loan.status, "Loan request updated");
        Ok(loan)
    }

    /// Approve a loan request. Any prior status may be overwritten.
    pub async fn approve(&self, id: i64) -> Result<LoanRequest, LoanError> {
        self.transition(id, LoanStatus::Approved).await
    }

    /// Reject a loan request. Any prior status may be overwritten.
    pub async fn reject(&self, id: i64) -> Result<LoanRequest, LoanError> {
        self.transition(id, LoanStatus::Rejected).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), LoanError> {
        if !self.store.delete(id).await? {
            return Err(LoanError::NotFound(id));
        }
        tracing::info!(loan_id = id, "Loan request deleted");
        Ok(())
    }

    async fn transition(&self, id: i64, status: LoanStatus) -> Result<LoanRequest, LoanError> {
        let loan = self.apply(id, LoanChanges::status(status)).await?;
        tracing::info!(loan_id = id, status = %status, "Loan request status changed");
        Ok(loan)
    }

    async fn apply(&self, id: i64, changes: LoanChanges) -> Result<LoanRequest, LoanError> {
        self.store
            .update(id, changes)
            .await?
            .ok_or(LoanError::NotFound(id))
    }
}
