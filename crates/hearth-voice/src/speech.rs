//! Fish Audio text-to-speech client.

use hearth_common::HearthError;
use hearth_config::SpeechConfig;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from speech synthesis.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Nothing to say.
    #[error("Text is empty")]
    EmptyText,

    /// Sending the request or reading the reply failed.
    #[error("Speech request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("Speech API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The API answered with no audio.
    #[error("Speech API returned no audio")]
    EmptyAudio,
}

impl From<SpeechError> for HearthError {
    fn from(err: SpeechError) -> Self {
        HearthError::network_with_source("Speech synthesis failed", err)
    }
}

/// Body of a synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechRequest<'a> {
    /// Text to speak.
    pub text: &'a str,
    /// Voice model.
    pub reference_id: &'a str,
    /// Audio container of the reply.
    pub format: &'static str,
}

/// Client for the synthesis endpoint.
#[derive(Debug, Clone)]
pub struct FishSpeechClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    reference_id: String,
}

impl FishSpeechClient {
    /// Client for the `speech` config section, or `None` when no API key is set.
    pub fn from_config(config: &SpeechConfig) -> Result<Option<Self>, SpeechError> {
        if !config.is_enabled() {
            debug!("Speech disabled, no API key configured");
            return Ok(None);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Some(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            reference_id: config.reference_id.clone(),
        }))
    }

    /// The HTTP request that synthesizes `text`.
    pub fn request(&self, text: &str) -> Result<reqwest::Request, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let body = SpeechRequest {
            text,
            reference_id: &self.reference_id,
            format: "mp3",
        };
        Ok(self
            .http
            .post(&self.api_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .build()?)
    }

    /// MP3 audio of `text` spoken by the configured voice.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let request = self.request(text)?;
        let response = self.http.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        info!(chars = text.len(), bytes = audio.len(), "Synthesized speech");
        Ok(audio.to_vec())
    }
}
