use async_trait::async_trait;
use lojavoz_common::{LojavozError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;
use tracing::{debug, info};

use crate::stt_trait::SpeechToText;
use crate::types::TranscriptionResponse;

/// Default transcription endpoint (OpenAI Whisper API)
const DEFAULT_API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Request timeout; audio uploads over slow links can take a while
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// OpenAI-compatible transcription API client
#[derive(Debug, Clone)]
pub struct WhisperApiClient {
    api_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl WhisperApiClient {
    /// Create new transcription client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// Override the endpoint URL (self-hosted OpenAI-compatible servers)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Endpoint URL this client posts to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Build the multipart form for one transcription request
    fn build_form(&self, audio: Vec<u8>, filename: String, language: &str) -> Result<Form> {
        let file_part = Part::bytes(audio)
            .file_name(filename)
            .mime_str("audio/wav")
            .map_err(|e| LojavozError::transcription(format!("Invalid mime type: {}", e)))?;

        Ok(Form::new()
            .text("model", self.model.clone())
            .text("language", language.to_string())
            .part("file", file_part))
    }
}

#[async_trait]
impl SpeechToText for WhisperApiClient {
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<String> {
        let audio = tokio::fs::read(audio_path).await.map_err(|e| {
            LojavozError::file_system(format!(
                "Failed to read audio file {}: {}",
                audio_path.display(),
                e
            ))
        })?;

        let filename = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "recording.wav".to_string());

        debug!(
            "Sending transcription request - Model: {}, Language: {}, Bytes: {}",
            self.model,
            language,
            audio.len()
        );

        let form = self.build_form(audio, filename, language)?;

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| LojavozError::transcription(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LojavozError::transcription(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| LojavozError::transcription(format!("Failed to parse response: {}", e)))?;

        info!("Transcription received - Length: {} chars", result.text.len());

        Ok(result.text)
    }
}
