//! Client for the external loan eligibility service
//!
//! The service receives `{"cuil": <id_number>}` with an `x-api-key` header and
//! answers with a JSON body whose `status` field is `"approved"` when the
//! applicant is eligible. Any other outcome, including transport failures,
//! timeouts and non-2xx responses, is a rejection. There are no retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EligibilityConfig;

const APPROVED: &str = "approved";

/// Decides whether an applicant identified by `id_number` is eligible
#[async_trait]
pub trait EligibilityChecker: Send + Sync {
    async fn check_eligibility(&self, id_number: &str) -> bool;
}

#[derive(Debug, Serialize)]
struct EligibilityRequest<'a> {
    cuil: &'a str,
}

#[derive(Debug, Deserialize)]
struct EligibilityResponse {
    status: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
enum EligibilityError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP implementation against the configured validation API
#[derive(Clone)]
pub struct HttpEligibilityChecker {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEligibilityChecker {
    pub fn new(config: &EligibilityConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn request_decision(&self, id_number: &str) -> Result<serde_json::Value, EligibilityError> {
        let body = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .json(&EligibilityRequest { cuil: id_number })
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        Ok(body)
    }
}

#[async_trait]
impl EligibilityChecker for HttpEligibilityChecker {
    async fn check_eligibility(&self, id_number: &str) -> bool {
        match self.request_decision(id_number).await {
            Ok(payload) => {
                tracing::info!(payload = %payload, "Loan validation request successful");
                is_approved(payload)
            }
            Err(e) => {
                tracing::error!(error = %e, "Loan validation request failed");
                false
            }
        }
    }
}

fn is_approved(payload: serde_json::Value) -> bool {
    serde_json::from_value::<EligibilityResponse>(payload)
        .ok()
        .and_then(|r| r.status)
        .is_some_and(|status| status == APPROVED)
}
