//! Runtime configuration: the resolved `Config`, its TOML file mirror, and the builder.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

pub(crate) use crate::core::error::Result;

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_REACHER_API_URL: &str = "https://api.reacher.email";
pub const DEFAULT_OPENOUTREACH_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_BRIGHTDATA_TRIGGER_URL: &str = "https://api.brightdata.com/datasets/v3/trigger";
pub const DEFAULT_BRIGHTDATA_SNAPSHOT_URL: &str =
    "https://api.brightdata.com/datasets/v3/snapshot";
pub const DEFAULT_PROFILE_DATASET_ID: &str = "gd_l1viktl72bvl7bjuj0";
pub const DEFAULT_COMPANY_DATASET_ID: &str = "gd_l1vikfnt1wgvvqz95w";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-5.2";
pub const DEFAULT_PRODUCT_DESCRIPTION: &str = "[YOUR_PRODUCT_DESCRIPTION_HERE]";

/// A string that never shows up in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "\"\"")
        } else {
            write!(f, "\"***\"")
        }
    }
}

/// Knobs of the candidate search. Passed explicitly into
/// [`CandidateSearchEngine::new`](crate::CandidateSearchEngine::new).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Cap on the patterns generated for one name variant.
    pub max_patterns_per_lead: usize,
    /// Fixed pause between two oracle calls.
    pub validation_delay: Duration,
    /// Keep a `risky` (e.g. catch-all) address as fallback when no `safe` one turns up.
    pub include_risky: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_patterns_per_lead: 20,
            validation_delay: Duration::from_millis(1500),
            include_risky: false,
        }
    }
}

/// Settings for the LinkedIn automation pipeline.
#[derive(Debug, Clone)]
pub struct LinkedInSettings {
    pub api_url: String,
    pub api_key: Option<SecretString>,
    pub account_handle: String,
    pub account_username: String,
    pub account_password: SecretString,
    pub account_proxy: Option<String>,
    pub daily_connections: u32,
    pub daily_messages: u32,
    pub profile_visit_duration_s: f64,
    pub profile_visit_scroll_depth: u32,
    pub run_poll_interval: Duration,
    pub run_poll_timeout: Duration,
    pub lead_delay: Duration,
}

impl Default for LinkedInSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_OPENOUTREACH_API_URL.to_string(),
            api_key: None,
            account_handle: String::new(),
            account_username: String::new(),
            account_password: SecretString::default(),
            account_proxy: None,
            daily_connections: 50,
            daily_messages: 20,
            profile_visit_duration_s: 5.0,
            profile_visit_scroll_depth: 3,
            run_poll_interval: Duration::from_secs(2),
            run_poll_timeout: Duration::from_secs(300),
            lead_delay: Duration::from_secs(1),
        }
    }
}

/// Settings for the profile enrichment and message personalization pipeline.
#[derive(Debug, Clone)]
pub struct PersonalizationSettings {
    pub brightdata_api_key: SecretString,
    pub brightdata_trigger_url: String,
    pub brightdata_snapshot_url: String,
    pub profile_dataset_id: String,
    pub company_dataset_id: String,
    pub openai_api_key: SecretString,
    pub openai_api_url: String,
    pub llm_model: String,
    pub max_completion_tokens: u32,
    pub product_description: String,
    pub local_profiles_path: Option<String>,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl Default for PersonalizationSettings {
    fn default() -> Self {
        Self {
            brightdata_api_key: SecretString::default(),
            brightdata_trigger_url: DEFAULT_BRIGHTDATA_TRIGGER_URL.to_string(),
            brightdata_snapshot_url: DEFAULT_BRIGHTDATA_SNAPSHOT_URL.to_string(),
            profile_dataset_id: DEFAULT_PROFILE_DATASET_ID.to_string(),
            company_dataset_id: DEFAULT_COMPANY_DATASET_ID.to_string(),
            openai_api_key: SecretString::default(),
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            max_completion_tokens: 400,
            product_description: DEFAULT_PRODUCT_DESCRIPTION.to_string(),
            local_profiles_path: None,
            poll_interval: Duration::from_secs(5),
            poll_timeout: Duration::from_secs(300),
        }
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub request_timeout: Duration,
    pub user_agent: String,
    pub reacher_api_url: String,
    pub reacher_api_key: Option<SecretString>,
    pub search: SearchConfig,
    pub linkedin: LinkedInSettings,
    pub personalization: PersonalizationSettings,
    /// Path of the TOML file the base settings came from, if any.
    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: format!("lead-sleuth/{}", env!("CARGO_PKG_VERSION")),
            reacher_api_url: DEFAULT_REACHER_API_URL.to_string(),
            reacher_api_key: None,
            search: SearchConfig::default(),
            linkedin: LinkedInSettings::default(),
            personalization: PersonalizationSettings::default(),
            loaded_config_path: None,
        }
    }
}

/// Mirror of the TOML configuration file. Every field is optional; unset
/// fields leave the current value untouched.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct ConfigFile {
    pub network: NetworkSection,
    pub reacher: ReacherSection,
    pub search: SearchSection,
    pub linkedin: LinkedInSection,
    pub personalization: PersonalizationSection,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkSection {
    /// Seconds; fractions allowed.
    pub request_timeout: Option<f64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct ReacherSection {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct SearchSection {
    pub max_patterns_per_lead: Option<usize>,
    pub validation_delay_seconds: Option<f64>,
    pub include_risky: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct LinkedInSection {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub account_handle: Option<String>,
    pub account_username: Option<String>,
    pub account_password: Option<String>,
    pub account_proxy: Option<String>,
    pub daily_connections: Option<u32>,
    pub daily_messages: Option<u32>,
    pub profile_visit_duration_s: Option<f64>,
    pub profile_visit_scroll_depth: Option<u32>,
    pub run_poll_interval_s: Option<f64>,
    pub run_poll_timeout_s: Option<f64>,
    pub lead_delay_s: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct PersonalizationSection {
    pub brightdata_api_key: Option<String>,
    pub brightdata_trigger_url: Option<String>,
    pub brightdata_snapshot_url: Option<String>,
    pub profile_dataset_id: Option<String>,
    pub company_dataset_id: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_api_url: Option<String>,
    pub llm_model: Option<String>,
    pub max_completion_tokens: Option<u32>,
    pub product_description: Option<String>,
    pub local_profiles_path: Option<String>,
    pub poll_interval_s: Option<f64>,
    pub poll_timeout_s: Option<f64>,
}
