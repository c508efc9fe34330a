//! Client for the OpenOutreach LinkedIn automation server.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::utils::polling::{poll_until, Poll};

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub const RUN_COMPLETED: &str = "completed";
pub const RUN_FAILED: &str = "failed";

/// One automated LinkedIn action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Touchpoint {
    ProfileVisit {
        url: String,
        duration_s: f64,
        scroll_depth: u32,
    },
    Connect {
        url: String,
        note: String,
    },
}

impl Touchpoint {
    pub fn kind(&self) -> &'static str {
        match self {
            Touchpoint::ProfileVisit { .. } => "profile_visit",
            Touchpoint::Connect { .. } => "connect",
        }
    }
}

/// State of a run as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunResponse {
    pub run_id: String,
    pub status: String,
    pub error: Option<String>,
    pub result: Option<Value>,
}

impl RunResponse {
    pub fn is_terminal(&self) -> bool {
        self.status == RUN_COMPLETED || self.status == RUN_FAILED
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Account {
    pub handle: String,
    pub active: bool,
    pub daily_connections: u32,
    pub daily_messages: u32,
}

/// Body of `POST /api/v1/accounts`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub handle: String,
    pub username: String,
    pub password: String,
    pub active: bool,
    pub proxy: Option<String>,
    pub daily_connections: u32,
    pub daily_messages: u32,
    pub booking_link: Option<String>,
}

#[derive(Clone)]
pub struct OpenOutreachClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenOutreachClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.linkedin.api_url.trim_end_matches('/').to_string(),
            api_key: config
                .linkedin
                .api_key
                .as_ref()
                .filter(|k| !k.is_empty())
                .map(|k| k.expose().to_string()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .http_client
            .request(method, format!("{}{}", self.base_url, path));
        match self.api_key {
            Some(ref key) => request.header("X-API-Key", key),
            None => request,
        }
    }

    /// Queues `touchpoint` for the account `handle`.
    pub async fn create_run(
        &self,
        handle: &str,
        touchpoint: &Touchpoint,
        tags: &BTreeMap<String, String>,
        dry_run: bool,
    ) -> Result<RunResponse> {
        let payload = json!({
            "handle": handle,
            "touchpoint": touchpoint,
            "dry_run": dry_run,
            "tags": tags,
        });
        let response = self
            .request(Method::POST, "/api/v1/runs")
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .inspect_err(|e| tracing::error!(target: "openoutreach", "API error creating run: {}", e))?;
        Ok(response.json().await?)
    }

    pub async fn get_run(&self, run_id: &str) -> Result<RunResponse> {
        let response = self
            .request(Method::GET, &format!("/api/v1/runs/{}", run_id))
            .send()
            .await?
            .error_for_status()
            .inspect_err(|e| tracing::error!(target: "openoutreach", "API error getting run {}: {}", run_id, e))?;
        Ok(response.json().await?)
    }

    /// Polls a run until it is `completed` or `failed`.
    pub async fn poll_run_until_complete(
        &self,
        run_id: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<RunResponse> {
        let label = format!("Run {}", run_id);
        poll_until(&label, interval, timeout, || async move {
            let run = self.get_run(run_id).await?;
            if run.is_terminal() {
                Ok(Poll::Ready(run))
            } else {
                Ok(Poll::Pending(run.status))
            }
        })
        .await
    }

    /// `Ok(None)` when the server does not know `handle`.
    pub async fn get_account(&self, handle: &str) -> Result<Option<Account>> {
        let response = self
            .request(Method::GET, &format!("/api/v1/accounts/{}", handle))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .inspect_err(|e| tracing::error!(target: "openoutreach", "API error getting account {}: {}", handle, e))?;
        Ok(Some(response.json().await?))
    }

    pub async fn account_exists(&self, handle: &str) -> Result<bool> {
        Ok(self.get_account(handle).await?.is_some())
    }

    pub async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let response = self
            .request(Method::POST, "/api/v1/accounts")
            .json(account)
            .send()
            .await?
            .error_for_status()
            .inspect_err(|e| tracing::error!(target: "openoutreach", "API error creating account: {}", e))?;
        Ok(response.json().await?)
    }
}
