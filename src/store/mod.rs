//! Persistence for loan requests and staff accounts
//!
//! Handlers and services talk to the [`LoanStore`] and [`UserStore`] traits;
//! the PostgreSQL implementations live in [`postgres`].

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{LoanChanges, LoanRequest, NewLoanRequest, NewUser, User};

mod postgres;

pub use postgres::{PgLoanStore, PgUserStore};

/// Store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("a loan request with this id number already exists")]
    DuplicateIdNumber,

    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Loan request persistence. Every method is a single-row (or single
/// statement) operation; concurrent writers to the same row are last-write-wins.
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn insert(&self, loan: NewLoanRequest) -> StoreResult<LoanRequest>;

    /// All loan requests ordered by id
    async fn list(&self) -> StoreResult<Vec<LoanRequest>>;

    async fn get(&self, id: i64) -> StoreResult<Option<LoanRequest>>;

    /// Apply `changes` and bump `updated_at`. `Ok(None)` if the row is absent.
    async fn update(&self, id: i64, changes: LoanChanges) -> StoreResult<Option<LoanRequest>>;

    /// `Ok(false)` if the row is absent
    async fn delete(&self, id: i64) -> StoreResult<bool>;

    /// Whether `id_number` is taken by a record other than `exclude_id`
    async fn id_number_taken(&self, id_number: &str, exclude_id: Option<i64>)
        -> StoreResult<bool>;

    async fn count(&self) -> StoreResult<i64>;
}

/// Staff account persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Insert the account unless the username exists. Returns whether a row was created.
    async fn create_if_missing(&self, user: NewUser) -> StoreResult<bool>;
}
