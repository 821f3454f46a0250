//! Explicit, idempotent seed steps
//!
//! Default staff accounts and demo loan requests are created only when an
//! operator runs the corresponding command, never as a side effect of
//! migrations. Running a step twice changes nothing the second time.

use std::collections::HashSet;

use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::auth::hash_password;
use crate::models::{Gender, LoanStatus, NewLoanRequest, NewUser, UserRole};
use crate::store::{LoanStore, StoreError, UserStore};

pub const DEMO_LOAN_COUNT: usize = 5;

const FIRST_NAMES: [&str; 8] = [
    "Lucía", "Mateo", "Valentina", "Santiago", "Camila", "Benjamín", "Martina", "Joaquín",
];
const LAST_NAMES: [&str; 8] = [
    "González", "Rodríguez", "Fernández", "López", "Martínez", "Romero", "Sosa", "Álvarez",
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// A staff account created by [`seed_default_users`]
#[derive(Debug, Clone)]
pub struct DefaultAccount {
    pub username: &'static str,
    pub email: &'static str,
    pub role: UserRole,
    pub password: String,
}

impl DefaultAccount {
    pub fn defaults(admin_password: &str, analyst_password: &str) -> [DefaultAccount; 2] {
        [
            DefaultAccount {
                username: "admin",
                email: "admin@example.com",
                role: UserRole::Admin,
                password: admin_password.to_string(),
            },
            DefaultAccount {
                username: "analyst",
                email: "analyst@example.com",
                role: UserRole::Analyst,
                password: analyst_password.to_string(),
            },
        ]
    }
}

/// Ensure the default Admin and Analyst accounts exist.
///
/// Returns the usernames that were created by this call.
pub async fn seed_default_users(
    users: &dyn UserStore,
    accounts: &[DefaultAccount],
) -> Result<Vec<String>, SeedError> {
    let mut created = Vec::new();

    for account in accounts {
        if users.find_by_username(account.username).await?.is_some() {
            tracing::debug!(username = account.username, "Default account already exists");
            continue;
        }

        let inserted = users
            .create_if_missing(NewUser {
                username: account.username.to_string(),
                email: account.email.to_string(),
                password_hash: hash_password(&account.password)?,
                is_staff: true,
                role: Some(account.role),
            })
            .await?;

        if inserted {
            tracing::info!(
                username = account.username,
                role = account.role.as_str(),
                "Default account created"
            );
            created.push(account.username.to_string());
        }
    }

    Ok(created)
}

/// Result of [`seed_demo_loans`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Not a local debug deployment
    NotAllowed,
    /// Loan requests already exist
    AlreadySeeded,
    Created(usize),
}

/// Create [`DEMO_LOAN_COUNT`] fake loan requests on an empty local database
pub async fn seed_demo_loans<R: Rng>(
    loans: &dyn LoanStore,
    allowed: bool,
    rng: &mut R,
) -> Result<SeedOutcome, SeedError> {
    if !allowed {
        tracing::warn!("Not in local environment. Skipping seeding.");
        return Ok(SeedOutcome::NotAllowed);
    }

    if loans.count().await? > 0 {
        tracing::info!("Loans already exist. Skipping seeding.");
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let mut used_id_numbers = HashSet::new();
    while used_id_numbers.len() < DEMO_LOAN_COUNT {
        let loan = demo_loan(rng);
        if !used_id_numbers.insert(loan.id_number.clone()) {
            continue;
        }
        loans.insert(loan).await?;
    }

    tracing::info!(count = DEMO_LOAN_COUNT, "Seeded demo loan requests");
    Ok(SeedOutcome::Created(DEMO_LOAN_COUNT))
}

fn pick<'a, R: Rng>(rng: &mut R, items: &'a [&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

fn demo_loan<R: Rng>(rng: &mut R) -> NewLoanRequest {
    let first = pick(rng, &FIRST_NAMES);
    let last = pick(rng, &LAST_NAMES);
    let prefix = if rng.gen_bool(0.5) { 20 } else { 27 };

    NewLoanRequest {
        id_number: format!("{}{:09}", prefix, rng.gen_range(0..1_000_000_000u32)),
        full_name: format!("{} {}", first, last),
        gender: Gender::ALL[rng.gen_range(0..Gender::ALL.len())],
        email: format!(
            "{}.{}{}@example.com",
            ascii_lower(first),
            ascii_lower(last),
            rng.gen_range(1..100)
        ),
        amount: Decimal::new(rng.gen_range(1000..=10000), 0),
        status: if rng.gen_bool(0.5) {
            LoanStatus::Approved
        } else {
            LoanStatus::Rejected
        },
    }
}

/// Lowercase and strip diacritics for use in an email local part
fn ascii_lower(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' => 'u',
            other => other.to_ascii_lowercase(),
        })
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
