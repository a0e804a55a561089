use serde::Deserialize;

/// Response body of an OpenAI-compatible transcription endpoint
#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    /// Recognized text
    pub text: String,
}
