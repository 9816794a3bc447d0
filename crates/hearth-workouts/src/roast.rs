//! Admonishment text for users who missed their weekly goal.
//!
//! Text comes from an OpenAI-compatible chat completion endpoint when an API
//! key is configured. Every failure degrades to [`CANNED_ROAST`]; nothing in
//! here ever returns an error to the rollover loop.

use async_trait::async_trait;
use hearth_common::{truncate_string, HearthError};
use hearth_config::TextGenerationConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest generated text posted, in characters.
pub const MAX_ROAST_CHARS: usize = 400;

/// Used whenever generated text is unavailable.
pub const CANNED_ROAST: &str = "Skipping workouts again? Your couch is thrilled. The rest of us are not. 🛋️";

/// Produces a short admonishing line for a missed-week count.
#[async_trait]
pub trait RoastWriter: Send + Sync {
    /// A short message for someone who missed `missed_weeks` weeks in a row.
    async fn roast(&self, missed_weeks: u32) -> String;
}

/// Always returns [`CANNED_ROAST`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedRoaster;

#[async_trait]
impl RoastWriter for CannedRoaster {
    async fn roast(&self, _missed_weeks: u32) -> String {
        CANNED_ROAST.to_string()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat-completion backed roast writer.
pub struct OpenAiRoaster {
    client: reqwest::Client,
    config: TextGenerationConfig,
}

impl OpenAiRoaster {
    /// Build a client with the configured request timeout.
    pub fn new(config: TextGenerationConfig) -> Result<Self, HearthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| HearthError::network_with_source("Failed to build HTTP client", e))?;
        Ok(Self { client, config })
    }

    fn request_for(&self, missed_weeks: u32) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a blunt gym buddy in a Discord server. Reply with one short, \
                              playful roast. No slurs, no hashtags."
                        .to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Roast someone who missed their weekly workout goal {missed_weeks} week(s) in a row."
                    ),
                },
            ],
            max_tokens: self.config.max_tokens,
        }
    }

    async fn generate(&self, missed_weeks: u32) -> Result<String, HearthError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_for(missed_weeks))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| HearthError::network_with_source("Chat completion request failed", e))?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| HearthError::network_with_source("Chat completion response was not understood", e))?;

        first_choice(body).ok_or_else(|| HearthError::new("Chat completion returned no text"))
    }
}

#[async_trait]
impl RoastWriter for OpenAiRoaster {
    async fn roast(&self, missed_weeks: u32) -> String {
        if !self.config.is_enabled() {
            return CANNED_ROAST.to_string();
        }
        match self.generate(missed_weeks).await {
            Ok(text) => {
                debug!(missed_weeks, "Generated roast");
                text
            }
            Err(e) => {
                warn!(error = %e, "Falling back to canned roast");
                CANNED_ROAST.to_string()
            }
        }
    }
}

fn first_choice(body: ChatCompletionResponse) -> Option<String> {
    body.choices
        .into_iter()
        .next()
        .map(|choice| truncate_string(choice.message.content.trim(), MAX_ROAST_CHARS))
        .filter(|text| !text.is_empty())
}

/// The roast writer for a configuration: generated text when credentials are
/// present, canned text otherwise.
pub fn roast_writer(config: &TextGenerationConfig) -> Arc<dyn RoastWriter> {
    if !config.is_enabled() {
        return Arc::new(CannedRoaster);
    }
    match OpenAiRoaster::new(config.clone()) {
        Ok(roaster) => Arc::new(roaster),
        Err(e) => {
            warn!(error = %e, "Text generation unavailable, using canned roasts");
            Arc::new(CannedRoaster)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str) -> TextGenerationConfig {
        TextGenerationConfig {
            api_key: api_key.to_string(),
            api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            model: "test-model".to_string(),
            max_tokens: 40,
            timeout_seconds: 2,
        }
    }

    #[tokio::test]
    async fn test_missing_key_uses_canned_text() {
        let writer = roast_writer(&config(""));
        assert_eq!(writer.roast(3).await, CANNED_ROAST);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_uses_canned_text() {
        let roaster = OpenAiRoaster::new(config("sk-test")).unwrap();
        assert_eq!(roaster.roast(1).await, CANNED_ROAST);
    }

    #[test]
    fn test_request_shape() {
        let roaster = OpenAiRoaster::new(config("sk-test")).unwrap();
        let value = serde_json::to_value(roaster.request_for(2)).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["max_tokens"], 40);
        assert_eq!(value["messages"][0]["role"], "system");
        assert!(value["messages"][1]["content"].as_str().unwrap().contains("2 week(s)"));
    }

    #[test]
    fn test_first_choice_extraction() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"  Do a push-up.  "}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice(body).as_deref(), Some("Do a push-up."));

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_choice(empty), None);
    }
}
