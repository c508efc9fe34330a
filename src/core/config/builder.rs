//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile, Result};
use crate::AppError;
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// This is the primary way users should create a `Config` object.
/// It handles loading from files, applying overrides, and validation.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    skip_default_locations: bool,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    /// Do not look for `./lead-sleuth.toml` or `./config.toml` when no file is given.
    pub fn skip_default_locations(mut self) -> Self {
        self.skip_default_locations = true;
        self
    }

    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.network.request_timeout = Some(duration.as_secs_f64());
        self
    }
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.overrides.network.user_agent = Some(value.into());
        self
    }

    pub fn reacher_api_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.reacher.api_url = Some(url.into());
        self
    }
    pub fn reacher_api_key(mut self, key: impl Into<String>) -> Self {
        self.overrides.reacher.api_key = Some(key.into());
        self
    }

    pub fn max_patterns_per_lead(mut self, value: usize) -> Self {
        self.overrides.search.max_patterns_per_lead = Some(value);
        self
    }
    pub fn validation_delay_seconds(mut self, seconds: f64) -> Self {
        self.overrides.search.validation_delay_seconds = Some(seconds);
        self
    }
    pub fn include_risky(mut self, include: bool) -> Self {
        self.overrides.search.include_risky = Some(include);
        self
    }

    pub fn openoutreach_api_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.linkedin.api_url = Some(url.into());
        self
    }
    pub fn openoutreach_api_key(mut self, key: impl Into<String>) -> Self {
        self.overrides.linkedin.api_key = Some(key.into());
        self
    }
    pub fn account_handle(mut self, handle: impl Into<String>) -> Self {
        self.overrides.linkedin.account_handle = Some(handle.into());
        self
    }
    pub fn account_username(mut self, username: impl Into<String>) -> Self {
        self.overrides.linkedin.account_username = Some(username.into());
        self
    }
    pub fn account_password(mut self, password: impl Into<String>) -> Self {
        self.overrides.linkedin.account_password = Some(password.into());
        self
    }
    pub fn account_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.overrides.linkedin.account_proxy = Some(proxy.into());
        self
    }
    pub fn daily_connections(mut self, limit: u32) -> Self {
        self.overrides.linkedin.daily_connections = Some(limit);
        self
    }
    pub fn daily_messages(mut self, limit: u32) -> Self {
        self.overrides.linkedin.daily_messages = Some(limit);
        self
    }
    pub fn profile_visit_duration_seconds(mut self, seconds: f64) -> Self {
        self.overrides.linkedin.profile_visit_duration_s = Some(seconds);
        self
    }
    pub fn profile_visit_scroll_depth(mut self, depth: u32) -> Self {
        self.overrides.linkedin.profile_visit_scroll_depth = Some(depth);
        self
    }
    pub fn run_poll_interval_seconds(mut self, seconds: f64) -> Self {
        self.overrides.linkedin.run_poll_interval_s = Some(seconds);
        self
    }
    pub fn run_poll_timeout_seconds(mut self, seconds: f64) -> Self {
        self.overrides.linkedin.run_poll_timeout_s = Some(seconds);
        self
    }
    pub fn lead_delay_seconds(mut self, seconds: f64) -> Self {
        self.overrides.linkedin.lead_delay_s = Some(seconds);
        self
    }

    pub fn brightdata_api_key(mut self, key: impl Into<String>) -> Self {
        self.overrides.personalization.brightdata_api_key = Some(key.into());
        self
    }
    pub fn brightdata_trigger_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.personalization.brightdata_trigger_url = Some(url.into());
        self
    }
    pub fn brightdata_snapshot_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.personalization.brightdata_snapshot_url = Some(url.into());
        self
    }
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.overrides.personalization.openai_api_key = Some(key.into());
        self
    }
    pub fn openai_api_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.personalization.openai_api_url = Some(url.into());
        self
    }
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.overrides.personalization.llm_model = Some(model.into());
        self
    }
    pub fn product_description(mut self, description: impl Into<String>) -> Self {
        self.overrides.personalization.product_description = Some(description.into());
        self
    }
    pub fn local_profiles_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.personalization.local_profiles_path = Some(path.into());
        self
    }
    pub fn enrichment_poll_interval_seconds(mut self, seconds: f64) -> Self {
        self.overrides.personalization.poll_interval_s = Some(seconds);
        self
    }
    pub fn enrichment_poll_timeout_seconds(mut self, seconds: f64) -> Self {
        self.overrides.personalization.poll_timeout_s = Some(seconds);
        self
    }

    /// Builds the final `Config` object, applying defaults, file settings, overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config)?;
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else if !self.skip_default_locations {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./lead-sleuth.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    tracing::debug!("Found potential default config file: {}", path_str);
                    match load_config_file(path_str) {
                        Ok(file_config) => {
                            apply_file_config(&mut self.config, &file_config)?;
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::info!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides)?;
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}
