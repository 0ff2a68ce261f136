//! Speech adapters over OpenAI-compatible audio endpoints.
//!
//! Transcription posts multipart audio to `/audio/transcriptions` (Groq
//! hosts Whisper there). Synthesis posts JSON to `/audio/speech`, which
//! edge-tts bridges such as openai-edge-tts expose with Azure neural voices.

use async_trait::async_trait;
use careguide_core::audio::{Synthesizer, Transcriber};
use careguide_core::error::AudioError;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::openai_compat::{check_status, http_client, network_error};

/// Speech-to-text over `/audio/transcriptions`.
pub struct OpenAiCompatTranscriber {
    base_url: String,
    api_key: String,
    model: String,
    language: String,
    client: reqwest::Client,
}

impl OpenAiCompatTranscriber {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            language: language.into(),
            client: http_client(timeout),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for OpenAiCompatTranscriber {
    fn name(&self) -> &str {
        &self.model
    }

    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, AudioError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        debug!(model = %self.model, bytes = audio.len(), "Sending transcription request");

        let part = reqwest::multipart::Part::bytes(audio).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AudioError::Capability(network_error(e).to_string()))?;

        let response = check_status(response)
            .await
            .map_err(|e| AudioError::Capability(e.to_string()))?;

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| AudioError::Capability(format!("Failed to parse transcription: {e}")))?;

        Ok(body.text)
    }
}

/// Text-to-speech over `/audio/speech`, returning MP3 bytes.
pub struct OpenAiCompatSynthesizer {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatSynthesizer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl Synthesizer for OpenAiCompatSynthesizer {
    fn name(&self) -> &str {
        &self.model
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, AudioError> {
        let url = format!("{}/audio/speech", self.base_url);
        debug!(voice, chars = text.chars().count(), "Sending synthesis request");

        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": voice,
            "response_format": "mp3",
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AudioError::Capability(network_error(e).to_string()))?;

        let response = check_status(response)
            .await
            .map_err(|e| AudioError::Capability(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AudioError::Capability(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
