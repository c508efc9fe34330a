//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile, Result, SecretString};
use crate::core::error::AppError;
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loads configuration settings from a TOML file.
/// Returns the parsed `ConfigFile` content.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    tracing::debug!("Attempting to parse TOML from: {}", file_path);
    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

/// Converts a seconds value from the file or CLI into a `Duration`,
/// rejecting negative and non-finite numbers.
fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        AppError::Config(format!(
            "'{}' must be a finite, non-negative number of seconds (got {})",
            field, value
        ))
    })
}

/// Empty strings clear an optional setting.
fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Applies settings from a parsed `ConfigFile` onto a mutable `Config` instance.
/// Used both for the file itself and for builder overrides, so later calls win.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) -> Result<()> {
    // Network
    if let Some(timeout) = file_config.network.request_timeout {
        config.request_timeout = seconds("request_timeout", timeout)?;
    }
    if let Some(ref user_agent) = file_config.network.user_agent {
        config.user_agent = user_agent.clone();
    }

    // Reacher
    if let Some(ref url) = file_config.reacher.api_url {
        config.reacher_api_url = url.trim().to_string();
    }
    if let Some(ref key) = file_config.reacher.api_key {
        config.reacher_api_key = non_empty(key).map(SecretString::new);
    }

    // Search
    let search = &file_config.search;
    if let Some(max) = search.max_patterns_per_lead {
        config.search.max_patterns_per_lead = max;
    }
    if let Some(delay) = search.validation_delay_seconds {
        config.search.validation_delay = seconds("validation_delay_seconds", delay)?;
    }
    if let Some(include) = search.include_risky {
        config.search.include_risky = include;
    }

    // LinkedIn
    let linkedin = &file_config.linkedin;
    if let Some(ref url) = linkedin.api_url {
        config.linkedin.api_url = url.trim().to_string();
    }
    if let Some(ref key) = linkedin.api_key {
        config.linkedin.api_key = non_empty(key).map(SecretString::new);
    }
    if let Some(ref handle) = linkedin.account_handle {
        config.linkedin.account_handle = handle.trim().to_string();
    }
    if let Some(ref username) = linkedin.account_username {
        config.linkedin.account_username = username.trim().to_string();
    }
    if let Some(ref password) = linkedin.account_password {
        config.linkedin.account_password = SecretString::new(password.clone());
    }
    if let Some(ref proxy) = linkedin.account_proxy {
        config.linkedin.account_proxy = non_empty(proxy);
    }
    if let Some(limit) = linkedin.daily_connections {
        config.linkedin.daily_connections = limit;
    }
    if let Some(limit) = linkedin.daily_messages {
        config.linkedin.daily_messages = limit;
    }
    if let Some(duration) = linkedin.profile_visit_duration_s {
        seconds("profile_visit_duration_s", duration)?;
        config.linkedin.profile_visit_duration_s = duration;
    }
    if let Some(depth) = linkedin.profile_visit_scroll_depth {
        config.linkedin.profile_visit_scroll_depth = depth;
    }
    if let Some(interval) = linkedin.run_poll_interval_s {
        config.linkedin.run_poll_interval = seconds("run_poll_interval_s", interval)?;
    }
    if let Some(timeout) = linkedin.run_poll_timeout_s {
        config.linkedin.run_poll_timeout = seconds("run_poll_timeout_s", timeout)?;
    }
    if let Some(delay) = linkedin.lead_delay_s {
        config.linkedin.lead_delay = seconds("lead_delay_s", delay)?;
    }

    // Personalization
    let personalization = &file_config.personalization;
    if let Some(ref key) = personalization.brightdata_api_key {
        config.personalization.brightdata_api_key = SecretString::new(key.trim());
    }
    if let Some(ref url) = personalization.brightdata_trigger_url {
        config.personalization.brightdata_trigger_url = url.trim().to_string();
    }
    if let Some(ref url) = personalization.brightdata_snapshot_url {
        config.personalization.brightdata_snapshot_url = url.trim().to_string();
    }
    if let Some(ref id) = personalization.profile_dataset_id {
        config.personalization.profile_dataset_id = id.trim().to_string();
    }
    if let Some(ref id) = personalization.company_dataset_id {
        config.personalization.company_dataset_id = id.trim().to_string();
    }
    if let Some(ref key) = personalization.openai_api_key {
        config.personalization.openai_api_key = SecretString::new(key.trim());
    }
    if let Some(ref url) = personalization.openai_api_url {
        config.personalization.openai_api_url = url.trim().to_string();
    }
    if let Some(ref model) = personalization.llm_model {
        config.personalization.llm_model = model.trim().to_string();
    }
    if let Some(tokens) = personalization.max_completion_tokens {
        config.personalization.max_completion_tokens = tokens;
    }
    if let Some(ref description) = personalization.product_description {
        config.personalization.product_description = description.clone();
    }
    if let Some(ref path) = personalization.local_profiles_path {
        config.personalization.local_profiles_path = non_empty(path);
    }
    if let Some(interval) = personalization.poll_interval_s {
        config.personalization.poll_interval = seconds("poll_interval_s", interval)?;
    }
    if let Some(timeout) = personalization.poll_timeout_s {
        config.personalization.poll_timeout = seconds("poll_timeout_s", timeout)?;
    }

    Ok(())
}
