//! Bright Data scraper API: trigger a collection, then download its snapshot.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::utils::polling::{poll_until, Poll};

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

const SERVICE: &str = "Bright Data";
const MIN_TIMEOUT: Duration = Duration::from_secs(60);

/// What the trigger endpoint answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Small collections are answered synchronously.
    Ready(Vec<Value>),
    /// Otherwise the results must be polled for.
    Snapshot(String),
}

#[derive(Clone)]
pub struct BrightDataClient {
    http_client: Client,
    api_key: String,
    dataset_id: String,
    trigger_url: String,
    snapshot_url: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl BrightDataClient {
    pub fn new(config: &Config, dataset_id: &str) -> Result<Self> {
        let settings = &config.personalization;
        if settings.brightdata_api_key.is_empty() {
            return Err(AppError::Config(
                "BRIGHTDATA_API_KEY is required to scrape LinkedIn profiles.".to_string(),
            ));
        }
        if dataset_id.trim().is_empty() {
            return Err(AppError::Config(
                "Bright Data dataset id is required for scraping.".to_string(),
            ));
        }

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout.max(MIN_TIMEOUT))
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: settings.brightdata_api_key.expose().to_string(),
            dataset_id: dataset_id.trim().to_string(),
            trigger_url: settings.brightdata_trigger_url.clone(),
            snapshot_url: settings.brightdata_snapshot_url.trim_end_matches('/').to_string(),
            poll_interval: settings.poll_interval,
            poll_timeout: settings.poll_timeout,
        })
    }

    /// Triggers a collection for `urls`.
    pub async fn submit(&self, urls: &[String]) -> Result<Submission> {
        let payload: Vec<Value> = urls.iter().map(|url| json!({ "url": url })).collect();
        let data: Value = self
            .http_client
            .post(&self.trigger_url)
            .bearer_auth(&self.api_key)
            .query(&[
                ("dataset_id", self.dataset_id.as_str()),
                ("include_errors", "true"),
                ("format", "json"),
            ])
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Value::Array(results) = data {
            tracing::info!(target: "brightdata", "Bright Data returned synchronous results. records={}", results.len());
            return Ok(Submission::Ready(results));
        }

        let snapshot_id = ["snapshot_id", "id"]
            .iter()
            .find_map(|key| match data.get(key) {
                Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            })
            .ok_or_else(|| AppError::Api {
                service: SERVICE,
                message: format!("response missing snapshot_id: {}", data),
            })?;
        tracing::info!(target: "brightdata", "Bright Data submission accepted. snapshot_id={}", snapshot_id);
        Ok(Submission::Snapshot(snapshot_id))
    }

    /// Waits for a snapshot to finish building and returns its records.
    pub async fn poll_results(&self, snapshot_id: &str) -> Result<Vec<Value>> {
        let url = format!("{}/{}", self.snapshot_url, snapshot_id);
        let label = format!("Bright Data snapshot {}", snapshot_id);

        let results = poll_until(&label, self.poll_interval, self.poll_timeout, || {
            let url = url.as_str();
            async move {
                let response = self
                    .http_client
                    .get(url)
                    .bearer_auth(&self.api_key)
                    .query(&[("format", "json")])
                    .send()
                    .await?;

                if response.status() == StatusCode::ACCEPTED {
                    let body: Value = response.json().await.unwrap_or(Value::Null);
                    let status = body
                        .get("status")
                        .and_then(Value::as_str)
                        .unwrap_or("building")
                        .to_string();
                    return Ok(Poll::Pending(status));
                }

                match response.error_for_status()?.json::<Value>().await? {
                    Value::Null => Ok(Poll::Ready(Vec::new())),
                    Value::Array(records) => Ok(Poll::Ready(records)),
                    other => Err(AppError::Api {
                        service: SERVICE,
                        message: format!("unexpected snapshot payload: {}", other),
                    }),
                }
            }
        })
        .await?;

        tracing::info!(target: "brightdata", "Bright Data results ready. records={}", results.len());
        Ok(results)
    }

    /// Submits `urls` and, when needed, polls until the results are in.
    pub async fn fetch(&self, urls: &[String]) -> Result<Vec<Value>> {
        match self.submit(urls).await? {
            Submission::Ready(results) => Ok(results),
            Submission::Snapshot(snapshot_id) => self.poll_results(&snapshot_id).await,
        }
    }
}
