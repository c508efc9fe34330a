//! Contains validation logic for the final Config struct.

use super::{Config, Result};
use crate::core::error::AppError;
use url::Url;

fn check_url(field: &str, value: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", field, value, e)))
}

/// Validates the configuration settings after loading and potential overrides.
/// Mutates the config to clamp values where that is the sensible reading.
/// Pipeline-specific credentials are checked by the pipelines themselves.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.search.max_patterns_per_lead == 0 {
        tracing::warn!("max_patterns_per_lead was set to 0. Setting to 1.");
        config.search.max_patterns_per_lead = 1;
    }
    if config.request_timeout.is_zero() {
        return Err(AppError::Config(
            "Request timeout must be greater than zero.".to_string(),
        ));
    }

    check_url("Reacher API URL", &config.reacher_api_url)?;
    check_url("OpenOutreach API URL", &config.linkedin.api_url)?;
    check_url(
        "Bright Data trigger URL",
        &config.personalization.brightdata_trigger_url,
    )?;
    check_url(
        "Bright Data snapshot URL",
        &config.personalization.brightdata_snapshot_url,
    )?;
    check_url("OpenAI API URL", &config.personalization.openai_api_url)?;

    if config.linkedin.run_poll_interval.is_zero() {
        tracing::warn!("LinkedIn run poll interval is zero; the server will be polled continuously.");
    }
    if config.linkedin.run_poll_timeout < config.linkedin.run_poll_interval {
        tracing::warn!(
            "LinkedIn run poll timeout ({:?}) is shorter than the poll interval ({:?}).",
            config.linkedin.run_poll_timeout,
            config.linkedin.run_poll_interval
        );
    }
    if config.personalization.llm_model.is_empty() {
        return Err(AppError::Config("LLM model name cannot be empty.".to_string()));
    }
    if config.personalization.max_completion_tokens == 0 {
        tracing::warn!("max_completion_tokens was set to 0. Setting to 400.");
        config.personalization.max_completion_tokens = 400;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_max_patterns_is_clamped() {
        let mut config = Config::default();
        config.search.max_patterns_per_lead = 0;
        validate_config(&mut config).unwrap();
        assert_eq!(config.search.max_patterns_per_lead, 1);
    }

    #[test]
    fn test_invalid_reacher_url_is_rejected() {
        let mut config = Config::default();
        config.reacher_api_url = "'https://api.reacher.email".to_string();
        assert!(matches!(
            validate_config(&mut config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_defaults_are_valid() {
        let mut config = Config::default();
        assert!(validate_config(&mut config).is_ok());
    }
}
