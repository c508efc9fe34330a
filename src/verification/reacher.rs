//! Client for the Reacher email verification API (self-hosted or managed).

use super::VerificationOracle;
use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{Reachability, VerificationResult};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Raw `check_email` response. Sub-blocks may be missing or replaced by an
/// error object, so every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CheckEmailResponse {
    is_reachable: Option<String>,
    smtp: Option<SmtpBlock>,
    misc: Option<MiscBlock>,
    mx: Option<MxBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SmtpBlock {
    is_deliverable: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MiscBlock {
    is_disposable: Option<bool>,
    is_role_account: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MxBlock {
    records: Option<Vec<String>>,
}

fn parse_reachability(value: Option<&str>) -> Reachability {
    match value {
        Some("safe") => Reachability::Safe,
        Some("risky") => Reachability::Risky,
        _ => Reachability::Invalid,
    }
}

impl From<CheckEmailResponse> for VerificationResult {
    fn from(response: CheckEmailResponse) -> Self {
        VerificationResult {
            reachability: parse_reachability(response.is_reachable.as_deref()),
            smtp_deliverable: response
                .smtp
                .and_then(|s| s.is_deliverable)
                .unwrap_or(false),
            is_disposable: response
                .misc
                .as_ref()
                .and_then(|m| m.is_disposable)
                .unwrap_or(false),
            is_role_account: response
                .misc
                .as_ref()
                .and_then(|m| m.is_role_account)
                .unwrap_or(false),
            mx_records: response.mx.and_then(|mx| mx.records).unwrap_or_default(),
            raw_error: None,
        }
    }
}

/// Verifies addresses through `POST {api_url}/v0/check_email`.
#[derive(Clone)]
pub struct ReacherClient {
    http_client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ReacherClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/v0/check_email",
            config.reacher_api_url.trim_end_matches('/')
        );
        tracing::debug!(target: "reacher", "Reacher endpoint: {}", endpoint);

        Ok(Self {
            http_client,
            endpoint,
            api_key: config
                .reacher_api_key
                .as_ref()
                .filter(|k| !k.is_empty())
                .map(|k| k.expose().to_string()),
        })
    }

    async fn check_email(&self, email: &str) -> Result<CheckEmailResponse> {
        let mut request = self
            .http_client
            .post(&self.endpoint)
            .json(&json!({ "to_email": email }));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<CheckEmailResponse>().await?)
    }
}

#[async_trait]
impl VerificationOracle for ReacherClient {
    async fn verify(&self, email: &str) -> VerificationResult {
        match self.check_email(email).await {
            Ok(response) => {
                let result = VerificationResult::from(response);
                tracing::debug!(target: "reacher",
                    "<{}>: reachability={}, deliverable={}, disposable={}, role={}",
                    email, result.reachability, result.smtp_deliverable,
                    result.is_disposable, result.is_role_account
                );
                result
            }
            Err(e) => {
                tracing::error!(target: "reacher", "Reacher API error for {}: {}", email, e);
                VerificationResult::transport_failure(e.to_string())
            }
        }
    }
}
