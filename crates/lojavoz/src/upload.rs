use anyhow::{anyhow, Context, Result};
use lojavoz_recorder::{RecordingBlob, RECORDING_FILENAME, RECORDING_MIME};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

/// Successful pipeline-endpoint reply
#[derive(Debug, Deserialize)]
pub struct UploadReply {
    pub message: String,
    pub transcription: String,
}

#[derive(Debug, Deserialize)]
struct UploadError {
    error: String,
}

/// Submits a finalized recording to the pipeline endpoint.
///
/// Holds the pending blob between attempts: a failed submission keeps it,
/// so the memo can be resubmitted without re-recording. One request per
/// `submit` call, no automatic retry.
pub struct Uploader {
    endpoint: String,
    client: Client,
    pending: Option<RecordingBlob>,
}

impl Uploader {
    /// Create an uploader against the endpoint base URL
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
            pending: None,
        })
    }

    /// Hold a finalized recording for submission
    pub fn set_recording(&mut self, blob: RecordingBlob) {
        self.pending = Some(blob);
    }

    /// Whether a recording is waiting for (re)submission
    pub fn has_recording(&self) -> bool {
        self.pending.is_some()
    }

    /// Submit the held recording with the selected store id.
    ///
    /// No-op (returns `Ok(None)`) when no recording is held. On success the
    /// blob is cleared; on any failure it is preserved.
    pub async fn submit(&mut self, store_id: &str) -> Result<Option<UploadReply>> {
        let Some(blob) = self.pending.as_ref() else {
            return Ok(None);
        };

        let audio_part = Part::bytes(blob.bytes.clone())
            .file_name(RECORDING_FILENAME)
            .mime_str(RECORDING_MIME)
            .context("Failed to build audio part")?;

        let form = Form::new()
            .part("audio", audio_part)
            .text("store", store_id.to_string());

        let response = self
            .client
            .post(format!("{}/upload", self.endpoint.trim_end_matches('/')))
            .multipart(form)
            .send()
            .await
            .context("Failed to send upload")?;

        if !response.status().is_success() {
            let status = response.status();
            let cause = match response.json::<UploadError>().await {
                Ok(body) => body.error,
                Err(_) => "Unknown error".to_string(),
            };
            return Err(anyhow!("Upload failed ({}): {}", status, cause));
        }

        let reply: UploadReply = response
            .json()
            .await
            .context("Failed to parse upload reply")?;

        self.pending = None;
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> RecordingBlob {
        RecordingBlob {
            bytes: vec![0u8; 64],
        }
    }

    #[tokio::test]
    async fn test_submit_without_recording_is_noop() {
        let mut uploader = Uploader::new("http://localhost:3000").unwrap();

        let outcome = uploader.submit("loja1").await.unwrap();
        assert!(outcome.is_none());
        assert!(!uploader.has_recording());
    }

    #[tokio::test]
    async fn test_failed_submit_preserves_recording() {
        // Nothing listens on port 1; the request fails at the transport
        let mut uploader = Uploader::new("http://127.0.0.1:1").unwrap();
        uploader.set_recording(blob());

        let outcome = uploader.submit("loja1").await;
        assert!(outcome.is_err());
        assert!(uploader.has_recording());
    }

    #[test]
    fn test_set_recording() {
        let mut uploader = Uploader::new("http://localhost:3000").unwrap();
        assert!(!uploader.has_recording());
        uploader.set_recording(blob());
        assert!(uploader.has_recording());
    }
}
