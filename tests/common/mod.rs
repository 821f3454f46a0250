//! Shared harness for router-level tests: in-memory stores, a fixed
//! eligibility decision and token helpers.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use moni_backend::app;
use moni_backend::auth::{AuthService, TokenType};
use moni_backend::config::JwtConfig;
use moni_backend::eligibility::EligibilityChecker;
use moni_backend::loan_service::LoanService;
use moni_backend::models::{
    LoanChanges, LoanRequest, LoanStatus, NewLoanRequest, NewUser, User, UserRole,
};
use moni_backend::state::AppState;
use moni_backend::store::{LoanStore, StoreError, StoreResult, UserStore};

pub const TEST_SECRET: &str = "test-secret";

#[derive(Default)]
pub struct MemoryLoanStore {
    rows: Mutex<Vec<LoanRequest>>,
    next_id: Mutex<i64>,
}

impl MemoryLoanStore {
    pub fn snapshot(&self) -> Vec<LoanRequest> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl LoanStore for MemoryLoanStore {
    async fn insert(&self, loan: NewLoanRequest) -> StoreResult<LoanRequest> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.id_number == loan.id_number) {
            return Err(StoreError::DuplicateIdNumber);
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let now = Utc::now();
        let row = LoanRequest {
            id: *next_id,
            id_number: loan.id_number,
            full_name: loan.full_name,
            gender: loan.gender,
            email: loan.email,
            amount: loan.amount,
            status: loan.status,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list(&self) -> StoreResult<Vec<LoanRequest>> {
        let mut rows = self.snapshot();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn get(&self, id: i64) -> StoreResult<Option<LoanRequest>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, id: i64, changes: LoanChanges) -> StoreResult<Option<LoanRequest>> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(id_number) = &changes.id_number {
            if rows.iter().any(|r| r.id != id && &r.id_number == id_number) {
                return Err(StoreError::DuplicateIdNumber);
            }
        }

        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.id_number {
            row.id_number = v;
        }
        if let Some(v) = changes.full_name {
            row.full_name = v;
        }
        if let Some(v) = changes.gender {
            row.gender = v;
        }
        if let Some(v) = changes.email {
            row.email = v;
        }
        if let Some(v) = changes.amount {
            row.amount = v;
        }
        if let Some(v) = changes.status {
            row.status = v;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }

    async fn id_number_taken(&self, id_number: &str, exclude_id: Option<i64>) -> StoreResult<bool> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.id_number == id_number && Some(r.id) != exclude_id))
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn put(&self, user: User) {
        self.rows.lock().unwrap().push(user);
    }

    pub fn set_role(&self, id: Uuid, role: Option<UserRole>) {
        if let Some(user) = self.rows.lock().unwrap().iter_mut().find(|u| u.id == id) {
            user.role = role;
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_if_missing(&self, user: NewUser) -> StoreResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.username == user.username) {
            return Ok(false);
        }
        let now = Utc::now();
        rows.push(User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_staff: user.is_staff,
            role: user.role,
            created_at: now,
            updated_at: now,
        });
        Ok(true)
    }
}

/// Eligibility stub with a fixed answer that records every id number it saw
pub struct StubChecker {
    pub eligible: bool,
    pub calls: Mutex<Vec<String>>,
}

impl StubChecker {
    pub fn new(eligible: bool) -> Self {
        Self {
            eligible,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EligibilityChecker for StubChecker {
    async fn check_eligibility(&self, id_number: &str) -> bool {
        self.calls.lock().unwrap().push(id_number.to_string());
        self.eligible
    }
}

pub struct TestApp {
    pub router: Router,
    pub loans: Arc<MemoryLoanStore>,
    pub users: Arc<MemoryUserStore>,
    pub checker: Arc<StubChecker>,
    pub auth: Arc<AuthService>,
}

impl TestApp {
    pub fn new(eligible: bool) -> Self {
        let loans = Arc::new(MemoryLoanStore::default());
        let users = Arc::new(MemoryUserStore::default());
        let checker = Arc::new(StubChecker::new(eligible));

        let loan_service = Arc::new(LoanService::new(loans.clone(), checker.clone()));
        let auth = Arc::new(AuthService::new(
            users.clone(),
            JwtConfig {
                secret: TEST_SECRET.to_string(),
                access_token_ttl_seconds: 300,
                refresh_token_ttl_seconds: 86400,
            },
        ));

        Self {
            router: app::router(AppState::new(loan_service, auth.clone())),
            loans,
            users,
            checker,
            auth,
        }
    }

    /// Create an account with the given role and password. Low bcrypt cost keeps tests fast.
    pub fn add_user(&self, username: &str, password: &str, role: Option<UserRole>) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: bcrypt::hash(password, 4).unwrap(),
            is_staff: true,
            role,
            created_at: now,
            updated_at: now,
        };
        self.users.put(user.clone());
        user
    }

    /// Access token for a fresh account with `role`
    pub fn token_for(&self, role: Option<UserRole>) -> String {
        let username = match role {
            Some(role) => format!("{}-{}", role.as_str().to_lowercase(), Uuid::new_v4().simple()),
            None => format!("norole-{}", Uuid::new_v4().simple()),
        };
        let user = self.add_user(&username, "Secret1234", role);
        self.auth.issue(&user, TokenType::Access).unwrap()
    }

    pub fn admin_token(&self) -> String {
        self.token_for(Some(UserRole::Admin))
    }

    pub fn analyst_token(&self) -> String {
        self.token_for(Some(UserRole::Analyst))
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, body) = self.send_raw(method, uri, token, body).await;
        (status, body)
    }

    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    /// Insert a loan directly, bypassing the public endpoint
    pub async fn seed_loan(&self, id_number: &str, status: LoanStatus) -> LoanRequest {
        self.loans
            .insert(NewLoanRequest {
                id_number: id_number.to_string(),
                full_name: "Ana Gómez".to_string(),
                gender: moni_backend::models::Gender::Female,
                email: "ana@example.com".to_string(),
                amount: rust_decimal::Decimal::new(500000, 2),
                status,
            })
            .await
            .unwrap()
    }
}

pub fn loan_body(id_number: &str) -> Value {
    serde_json::json!({
        "id_number": id_number,
        "full_name": "Juan Pérez",
        "gender": "M",
        "email": "juan@example.com",
        "amount": "15000.00"
    })
}
