//! LinkedIn campaign: visit each profile, then send a connection request with a note.

use super::openoutreach::{NewAccount, OpenOutreachClient, Touchpoint, RUN_COMPLETED};
use crate::core::config::{Config, LinkedInSettings};
use crate::core::error::{AppError, Result};
use crate::utils::records::{export, load_rows, FlatRecord, InputRow, OutputFormat};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::time::sleep;

pub const LINKEDIN_URL_COLUMN: &str = "linkedin_url";
pub const NOTE_COLUMN: &str = "note";
const CAMPAIGN_TAG: &str = "linkedin_automation";

pub const CAMPAIGN_RESULT_COLUMNS: [&str; 9] = [
    "linkedin_url",
    "note",
    "profile_visit_status",
    "profile_visit_error",
    "profile_visit_run_id",
    "connect_status",
    "connect_error",
    "connect_run_id",
    "success",
];

/// How one touchpoint ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchpointOutcome {
    pub status: String,
    pub error: String,
    pub run_id: String,
}

impl TouchpointOutcome {
    fn skipped(reason: &str) -> Self {
        Self {
            status: "skipped".to_string(),
            error: reason.to_string(),
            run_id: String::new(),
        }
    }

    fn failed(error: &AppError, run_id: String) -> Self {
        Self {
            status: "failed".to_string(),
            error: error.to_string(),
            run_id,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RUN_COMPLETED
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignResult {
    pub linkedin_url: String,
    pub note: String,
    pub profile_visit: TouchpointOutcome,
    pub connect: TouchpointOutcome,
    pub passthrough: FlatRecord,
}

impl CampaignResult {
    pub fn success(&self) -> bool {
        self.profile_visit.is_completed() && self.connect.is_completed()
    }

    pub fn to_record(&self) -> FlatRecord {
        let mut record = FlatRecord::default();
        record.insert("linkedin_url", self.linkedin_url.as_str());
        record.insert("note", self.note.as_str());
        record.insert("profile_visit_status", self.profile_visit.status.as_str());
        record.insert("profile_visit_error", self.profile_visit.error.as_str());
        record.insert("profile_visit_run_id", self.profile_visit.run_id.as_str());
        record.insert("connect_status", self.connect.status.as_str());
        record.insert("connect_error", self.connect.error.as_str());
        record.insert("connect_run_id", self.connect.run_id.as_str());
        record.insert("success", self.success().to_string());
        for (column, value) in self.passthrough.iter() {
            if record.get(column).is_none() {
                record.insert(column, value);
            }
        }
        record
    }
}

pub struct LinkedInPipeline {
    client: OpenOutreachClient,
    settings: LinkedInSettings,
}

impl LinkedInPipeline {
    pub fn new(config: &Config) -> Result<Self> {
        let settings = config.linkedin.clone();
        let mut missing = Vec::new();
        if settings.account_handle.trim().is_empty() {
            missing.push("account handle (ACCOUNT_HANDLE)");
        }
        if settings.account_username.trim().is_empty() {
            missing.push("account username (ACCOUNT_USERNAME)");
        }
        if settings.account_password.is_empty() {
            missing.push("account password (ACCOUNT_PASSWORD)");
        }
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "LinkedIn automation requires: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            client: OpenOutreachClient::new(config)?,
            settings,
        })
    }

    /// Loads leads, runs the campaign and writes `campaign_results_<stamp>`.
    pub async fn run(&self, input: &Path, output_dir: &Path, format: OutputFormat) -> Result<PathBuf> {
        tracing::info!(target: "lead_task", "=== Starting LinkedIn Automation Pipeline ===");
        tracing::info!(target: "lead_task", "Account handle: {}", self.settings.account_handle);
        tracing::info!(target: "lead_task", "API URL: {}", self.settings.api_url);

        self.ensure_account_exists().await?;

        let rows = load_rows(input, &[LINKEDIN_URL_COLUMN, NOTE_COLUMN])?;
        let results = self.process_leads(&rows).await;
        let records: Vec<FlatRecord> = results.iter().map(CampaignResult::to_record).collect();
        let path = export(output_dir, "campaign_results", format, &records, &CAMPAIGN_RESULT_COLUMNS)?;

        let succeeded = results.iter().filter(|r| r.success()).count();
        tracing::info!(target: "lead_task",
            "=== Pipeline complete. Processed {} leads ({} fully successful) ===",
            results.len(), succeeded
        );
        Ok(path)
    }

    /// Creates the automation account unless the server already has it.
    pub async fn ensure_account_exists(&self) -> Result<()> {
        let handle = &self.settings.account_handle;
        tracing::info!(target: "openoutreach", "Checking if account '{}' exists...", handle);
        if self.client.account_exists(handle).await? {
            tracing::info!(target: "openoutreach", "Account '{}' already exists, skipping creation", handle);
            return Ok(());
        }

        tracing::info!(target: "openoutreach", "Account '{}' not found, creating new account...", handle);
        let account = self
            .client
            .create_account(&NewAccount {
                handle: handle.clone(),
                username: self.settings.account_username.clone(),
                password: self.settings.account_password.expose().to_string(),
                active: true,
                proxy: self.settings.account_proxy.clone(),
                daily_connections: self.settings.daily_connections,
                daily_messages: self.settings.daily_messages,
                booking_link: None,
            })
            .await?;
        tracing::info!(target: "openoutreach",
            "Account '{}' created (active={}, daily_connections={}, daily_messages={})",
            account.handle, account.active, account.daily_connections, account.daily_messages
        );
        Ok(())
    }

    /// Runs the campaign for every row in order. Never fails; problems end up in the results.
    pub async fn process_leads(&self, rows: &[InputRow]) -> Vec<CampaignResult> {
        let total = rows.len();
        let mut results = Vec::with_capacity(total);

        for (position, row) in rows.iter().enumerate() {
            let linkedin_url = row.get_trimmed(LINKEDIN_URL_COLUMN).to_string();
            let note = row.get_trimmed(NOTE_COLUMN).to_string();
            let passthrough: FlatRecord = row
                .fields
                .iter()
                .filter(|(column, _)| *column != LINKEDIN_URL_COLUMN && *column != NOTE_COLUMN)
                .collect();

            let skip_reason = if linkedin_url.is_empty() {
                Some("Missing linkedin_url")
            } else if note.is_empty() {
                Some("Missing note")
            } else {
                None
            };
            if let Some(reason) = skip_reason {
                tracing::warn!(target: "lead_task", "Skipping lead {}: {}", row.index, reason);
                results.push(CampaignResult {
                    linkedin_url,
                    note,
                    profile_visit: TouchpointOutcome::skipped(reason),
                    connect: TouchpointOutcome::skipped(reason),
                    passthrough,
                });
                continue;
            }

            tracing::info!(target: "lead_task", "Processing lead {}/{}: {}", position + 1, total, linkedin_url);
            let result = self.process_lead(row.index, linkedin_url, note, passthrough).await;
            results.push(result);

            if position + 1 < total {
                sleep(self.settings.lead_delay).await;
            }
        }
        results
    }

    async fn process_lead(
        &self,
        lead_idx: usize,
        linkedin_url: String,
        note: String,
        passthrough: FlatRecord,
    ) -> CampaignResult {
        let visit = Touchpoint::ProfileVisit {
            url: linkedin_url.clone(),
            duration_s: self.settings.profile_visit_duration_s,
            scroll_depth: self.settings.profile_visit_scroll_depth,
        };
        let profile_visit = self.execute_touchpoint(&visit, lead_idx).await;

        let connect = if profile_visit.is_completed() {
            let connect = Touchpoint::Connect {
                url: linkedin_url.clone(),
                note: note.clone(),
            };
            self.execute_touchpoint(&connect, lead_idx).await
        } else {
            tracing::warn!(target: "lead_task", "Lead {}: Skipping connection request, profile visit failed", lead_idx);
            TouchpointOutcome::skipped("Profile visit failed")
        };

        CampaignResult {
            linkedin_url,
            note,
            profile_visit,
            connect,
            passthrough,
        }
    }

    /// Creates a run for `touchpoint` and waits for it to finish.
    async fn execute_touchpoint(&self, touchpoint: &Touchpoint, lead_idx: usize) -> TouchpointOutcome {
        let kind = touchpoint.kind();
        let tags = BTreeMap::from([
            ("campaign".to_string(), CAMPAIGN_TAG.to_string()),
            ("lead_idx".to_string(), lead_idx.to_string()),
        ]);

        let created = match self
            .client
            .create_run(&self.settings.account_handle, touchpoint, &tags, false)
            .await
        {
            Ok(run) => run,
            Err(e) => {
                tracing::error!(target: "lead_task", "Lead {}: {} error: {}", lead_idx, kind, e);
                return TouchpointOutcome::failed(&e, String::new());
            }
        };
        tracing::info!(target: "lead_task", "Lead {}: {} run created: {}", lead_idx, kind, created.run_id);

        let finished = self
            .client
            .poll_run_until_complete(
                &created.run_id,
                self.settings.run_poll_interval,
                self.settings.run_poll_timeout,
            )
            .await;
        match finished {
            Ok(run) => {
                if run.status == RUN_COMPLETED {
                    tracing::info!(target: "lead_task", "Lead {}: {} completed successfully", lead_idx, kind);
                } else {
                    tracing::error!(target: "lead_task", "Lead {}: {} failed: {}",
                        lead_idx, kind, run.error.as_deref().unwrap_or("Unknown error"));
                }
                TouchpointOutcome {
                    status: run.status,
                    error: run.error.unwrap_or_default(),
                    run_id: created.run_id,
                }
            }
            Err(e) => {
                tracing::error!(target: "lead_task", "Lead {}: {} error: {}", lead_idx, kind, e);
                TouchpointOutcome::failed(&e, created.run_id)
            }
        }
    }
}
