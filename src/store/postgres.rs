//! PostgreSQL-backed stores

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{LoanStore, StoreError, StoreResult, UserStore};
use crate::models::{LoanChanges, LoanRequest, NewLoanRequest, NewUser, User};

const LOAN_COLUMNS: &str =
    "id, id_number, full_name, gender, email, amount, status, created_at, updated_at";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateIdNumber
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Loan request store on PostgreSQL
#[derive(Clone)]
pub struct PgLoanStore {
    db_pool: PgPool,
}

impl PgLoanStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LoanStore for PgLoanStore {
    async fn insert(&self, loan: NewLoanRequest) -> StoreResult<LoanRequest> {
        let query = format!(
            r#"
            INSERT INTO loan_requests (id_number, full_name, gender, email, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            LOAN_COLUMNS
        );

        let created = sqlx::query_as::<_, LoanRequest>(&query)
            .bind(&loan.id_number)
            .bind(&loan.full_name)
            .bind(loan.gender)
            .bind(&loan.email)
            .bind(loan.amount)
            .bind(loan.status)
            .fetch_one(&self.db_pool)
            .await?;

        Ok(created)
    }

    async fn list(&self) -> StoreResult<Vec<LoanRequest>> {
        let query = format!("SELECT {} FROM loan_requests ORDER BY id", LOAN_COLUMNS);
        let loans = sqlx::query_as::<_, LoanRequest>(&query)
            .fetch_all(&self.db_pool)
            .await?;
        Ok(loans)
    }

    async fn get(&self, id: i64) -> StoreResult<Option<LoanRequest>> {
        let query = format!("SELECT {} FROM loan_requests WHERE id = $1", LOAN_COLUMNS);
        let loan = sqlx::query_as::<_, LoanRequest>(&query)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(loan)
    }

    async fn update(&self, id: i64, changes: LoanChanges) -> StoreResult<Option<LoanRequest>> {
        let query = format!(
            r#"
            UPDATE loan_requests SET
                id_number = COALESCE($2, id_number),
                full_name = COALESCE($3, full_name),
                gender = COALESCE($4, gender),
                email = COALESCE($5, email),
                amount = COALESCE($6, amount),
                status = COALESCE($7, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LOAN_COLUMNS
        );

        let loan = sqlx::query_as::<_, LoanRequest>(&query)
            .bind(id)
            .bind(changes.id_number)
            .bind(changes.full_name)
            .bind(changes.gender)
            .bind(changes.email)
            .bind(changes.amount)
            .bind(changes.status)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(loan)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM loan_requests WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }

    async fn id_number_taken(
        &self,
        id_number: &str,
        exclude_id: Option<i64>,
    ) -> StoreResult<bool> {
        let (taken,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loan_requests
                WHERE id_number = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(id_number)
        .bind(exclude_id)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(taken)
    }

    async fn count(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM loan_requests")
            .fetch_one(&self.db_pool)
            .await?;
        Ok(count)
    }
}

/// Staff account store on PostgreSQL
#[derive(Clone)]
pub struct PgUserStore {
    db_pool: PgPool,
}

impl PgUserStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_staff, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_staff, role, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db_pool)
        .await?;
        Ok(user)
    }

    async fn create_if_missing(&self, user: NewUser) -> StoreResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_staff, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .bind(user.role)
        .execute(&self.db_pool)
        .await?
        .rows_affected();
        Ok(rows_affected == 1)
    }
}
