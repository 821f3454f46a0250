//! Loan request models and input validation

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::types::chrono::{DateTime, Utc};
use validator::{Validate, ValidationError};

use crate::error::{FieldErrors, NON_FIELD_ERRORS};

const MAX_ID_NUMBER_LEN: usize = 16;
const MAX_FULL_NAME_LEN: usize = 255;
const AMOUNT_MAX_DIGITS: u32 = 28;
const AMOUNT_DECIMAL_PLACES: u32 = 2;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_A_STRING: &str = "Not a valid string.";

/// Loan status, serialized with its short code
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "loan_status")]
pub enum LoanStatus {
    #[default]
    #[serde(rename = "PEN")]
    #[sqlx(rename = "PEN")]
    Pending,
    #[serde(rename = "APR")]
    #[sqlx(rename = "APR")]
    Approved,
    #[serde(rename = "REJ")]
    #[sqlx(rename = "REJ")]
    Rejected,
}

impl LoanStatus {
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "PEN",
            LoanStatus::Approved => "APR",
            LoanStatus::Rejected => "REJ",
        }
    }

    /// Initial status for a fresh submission given the eligibility decision
    pub fn from_eligibility(eligible: bool) -> Self {
        if eligible {
            LoanStatus::Approved
        } else {
            LoanStatus::Rejected
        }
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PEN" => Ok(LoanStatus::Pending),
            "APR" => Ok(LoanStatus::Approved),
            "REJ" => Ok(LoanStatus::Rejected),
            other => Err(format!("\"{}\" is not a valid choice.", other)),
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Applicant gender
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "gender")]
pub enum Gender {
    #[serde(rename = "M")]
    #[sqlx(rename = "M")]
    Male,
    #[serde(rename = "F")]
    #[sqlx(rename = "F")]
    Female,
    #[serde(rename = "O")]
    #[sqlx(rename = "O")]
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.code() == s)
            .ok_or_else(|| format!("\"{}\" is not a valid choice.", s))
    }
}

/// Persisted loan request
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct LoanRequest {
    pub id: i64,
    pub id_number: String,
    pub full_name: String,
    pub gender: Gender,
    pub email: String,
    pub amount: Decimal,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated values for inserting a loan request
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoanRequest {
    pub id_number: String,
    pub full_name: String,
    pub gender: Gender,
    pub email: String,
    pub amount: Decimal,
    pub status: LoanStatus,
}

/// Validated field changes for an existing loan request.
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanChanges {
    pub id_number: Option<String>,
    pub full_name: Option<String>,
    pub gender: Option<Gender>,
    pub email: Option<String>,
    pub amount: Option<Decimal>,
    pub status: Option<LoanStatus>,
}

impl LoanChanges {
    pub fn status(status: LoanStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

// ============================================================================
// Request payloads
// ============================================================================

/// Body of `POST /loan-requests/`.
///
/// Fields are taken as raw JSON so that a wrongly typed or null value is
/// reported under its own key. `id`, `status`, `created_at` and `updated_at`
/// are not part of the payload and are dropped if a client sends them.
#[derive(Debug, Default, Deserialize)]
pub struct LoanApplicationPayload {
    #[serde(default, deserialize_with = "present")]
    pub id_number: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub full_name: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub gender: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub email: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub amount: Option<Value>,
}

impl LoanApplicationPayload {
    /// Validate the submission and resolve it into insertable values.
    /// The status stays Pending until the eligibility decision is known.
    pub fn into_checked(self) -> Result<NewLoanRequest, FieldErrors> {
        let raw = RawLoanFields {
            id_number: self.id_number,
            full_name: self.full_name,
            gender: self.gender,
            email: self.email,
            amount: self.amount,
            status: None,
        };

        let mut errors = FieldErrors::default();
        raw.require_writable(&mut errors);
        let changes = raw.coerce(&mut errors).into_changes(errors)?;

        let LoanChanges {
            id_number: Some(id_number),
            full_name: Some(full_name),
            gender: Some(gender),
            email: Some(email),
            amount: Some(amount),
            ..
        } = changes
        else {
            return Err(FieldErrors::single(NON_FIELD_ERRORS, REQUIRED));
        };

        Ok(NewLoanRequest {
            id_number,
            full_name,
            gender,
            email,
            amount,
            status: LoanStatus::Pending,
        })
    }
}

/// Body of `PUT`/`PATCH /admin/loans/{id}/`.
///
/// Unlike the public submission, `status` is writable here. An explicit
/// `null` is an error, an absent key leaves the column untouched.
#[derive(Debug, Default, Deserialize)]
pub struct LoanUpdatePayload {
    #[serde(default, deserialize_with = "present")]
    pub id_number: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub full_name: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub gender: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub email: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub amount: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub status: Option<Value>,
}

impl LoanUpdatePayload {
    /// Validate a partial update: only supplied fields are checked
    pub fn into_partial_changes(self) -> Result<LoanChanges, FieldErrors> {
        let mut errors = FieldErrors::default();
        self.into_raw().coerce(&mut errors).into_changes(errors)
    }

    /// Validate a full update: every writable field except `status` is required
    pub fn into_full_changes(self) -> Result<LoanChanges, FieldErrors> {
        let raw = self.into_raw();
        let mut errors = FieldErrors::default();
        raw.require_writable(&mut errors);
        raw.coerce(&mut errors).into_changes(errors)
    }

    fn into_raw(self) -> RawLoanFields {
        RawLoanFields {
            id_number: self.id_number,
            full_name: self.full_name,
            gender: self.gender,
            email: self.email,
            amount: self.amount,
            status: self.status,
        }
    }
}

/// `None` for an absent key, `Some(Value::Null)` for an explicit null
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Loan fields as they arrived on the wire
struct RawLoanFields {
    id_number: Option<Value>,
    full_name: Option<Value>,
    gender: Option<Value>,
    email: Option<Value>,
    amount: Option<Value>,
    status: Option<Value>,
}

impl RawLoanFields {
    fn require_writable(&self, errors: &mut FieldErrors) {
        let fields = [
            ("id_number", &self.id_number),
            ("full_name", &self.full_name),
            ("gender", &self.gender),
            ("email", &self.email),
            ("amount", &self.amount),
        ];
        for (field, value) in fields {
            if value.is_none() {
                errors.add(field, REQUIRED);
            }
        }
    }

    /// Null and type errors are recorded under the field's key and leave the
    /// field unset. Text is trimmed.
    fn coerce(self, errors: &mut FieldErrors) -> LoanFields {
        LoanFields {
            id_number: text_field(self.id_number, "id_number", errors),
            full_name: text_field(self.full_name, "full_name", errors),
            gender: text_field(self.gender, "gender", errors),
            email: text_field(self.email, "email", errors),
            amount: not_null(self.amount, "amount", errors),
            status: text_field(self.status, "status", errors),
        }
    }
}

/// Coerced candidate values, checked by the field validators
#[derive(Debug, Default, Validate)]
struct LoanFields {
    #[validate(custom = "validate_id_number")]
    id_number: Option<String>,

    #[validate(custom = "validate_full_name")]
    full_name: Option<String>,

    #[validate(custom = "validate_gender")]
    gender: Option<String>,

    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    email: Option<String>,

    #[validate(custom = "validate_amount")]
    amount: Option<Value>,

    #[validate(custom = "validate_status")]
    status: Option<String>,
}

impl LoanFields {
    fn into_changes(self, mut errors: FieldErrors) -> Result<LoanChanges, FieldErrors> {
        if let Err(e) = self.validate() {
            errors.merge(e.into());
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let changes = LoanChanges {
            id_number: self.id_number,
            full_name: self.full_name,
            gender: self
                .gender
                .and_then(|g| parse_field::<Gender>(&g, "gender", &mut errors)),
            email: self.email,
            amount: self
                .amount
                .and_then(|v| parse_amount_field(&v, &mut errors)),
            status: self
                .status
                .and_then(|s| parse_field::<LoanStatus>(&s, "status", &mut errors)),
        };
        errors.into_result(changes)
    }
}

fn not_null(value: Option<Value>, field: &str, errors: &mut FieldErrors) -> Option<Value> {
    match value? {
        Value::Null => {
            errors.add(field, NOT_NULL);
            None
        }
        other => Some(other),
    }
}

/// Strings and numbers are accepted as text; anything else is a type error
fn text_field(value: Option<Value>, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match not_null(value, field, errors)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => {
            errors.add(field, NOT_A_STRING);
            None
        }
    }
}

// ============================================================================
// Field validators
// ============================================================================

fn validation_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

fn validate_id_number(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(validation_error(
            "blank",
            "This field may not be blank.".to_string(),
        ));
    }
    if value.chars().count() > MAX_ID_NUMBER_LEN {
        return Err(validation_error(
            "max_length",
            format!(
                "Ensure this field has no more than {} characters.",
                MAX_ID_NUMBER_LEN
            ),
        ));
    }
    Ok(())
}

fn validate_full_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(validation_error(
            "blank",
            "This field may not be blank.".to_string(),
        ));
    }
    if value.chars().count() > MAX_FULL_NAME_LEN {
        return Err(validation_error(
            "max_length",
            format!(
                "Ensure this field has no more than {} characters.",
                MAX_FULL_NAME_LEN
            ),
        ));
    }
    Ok(())
}

fn validate_gender(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Gender>()
        .map(|_| ())
        .map_err(|msg| validation_error("invalid_choice", msg))
}

fn validate_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<LoanStatus>()
        .map(|_| ())
        .map_err(|msg| validation_error("invalid_choice", msg))
}

fn validate_amount(value: &Value) -> Result<(), ValidationError> {
    parse_amount(value)
        .map(|_| ())
        .map_err(|msg| validation_error("invalid_amount", msg))
}

/// Parse a JSON number or numeric string into a two-place decimal amount
pub fn parse_amount(value: &Value) -> Result<Decimal, String> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        Value::Null => return Err(NOT_NULL.to_string()),
        _ => return Err("A valid number is required.".to_string()),
    };

    let mut amount = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| "A valid number is required.".to_string())?
        .normalize();

    if amount.scale() > AMOUNT_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            AMOUNT_DECIMAL_PLACES
        ));
    }

    let whole_digits = amount.trunc().abs().to_string().trim_start_matches('0').len() as u32;
    let max_whole_digits = AMOUNT_MAX_DIGITS - AMOUNT_DECIMAL_PLACES;
    if whole_digits > max_whole_digits {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            max_whole_digits
        ));
    }

    amount.rescale(AMOUNT_DECIMAL_PLACES);
    Ok(amount)
}

fn parse_field<T>(raw: &str, field: &str, errors: &mut FieldErrors) -> Option<T>
where
    T: FromStr<Err = String>,
{
    raw.parse()
        .map_err(|msg| errors.add(field, msg))
        .ok()
}

fn parse_amount_field(value: &Value, errors: &mut FieldErrors) -> Option<Decimal> {
    parse_amount(value)
        .map_err(|msg| errors.add("amount", msg))
        .ok()
}
