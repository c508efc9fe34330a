//! OpenAI-compatible chat completion client.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct LlmClient {
    http_client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_completion_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let settings = &config.personalization;
        if settings.openai_api_key.is_empty() {
            return Err(AppError::Config(
                "OPENAI_API_KEY is required for personalization.".to_string(),
            ));
        }

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: format!(
                "{}/chat/completions",
                settings.openai_api_url.trim_end_matches('/')
            ),
            api_key: settings.openai_api_key.expose().to_string(),
            model: settings.llm_model.clone(),
            max_completion_tokens: settings.max_completion_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` as a single user message and returns the first choice's
    /// text, trimmed. An answer without content yields an empty string.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "max_completion_tokens": self.max_completion_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if status.as_u16() == 429 {
                format!("rate limit hit: {}", body)
            } else {
                format!("HTTP {}: {}", status, body)
            };
            tracing::error!(target: "llm", "LLM request failed: {}", message);
            return Err(AppError::Api {
                service: "LLM",
                message,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default())
    }
}
