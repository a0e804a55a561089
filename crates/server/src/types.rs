use serde::{Deserialize, Serialize};

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status message
    pub message: String,
}

/// Successful upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Status message
    pub message: String,

    /// Recognized text, exactly as the transcription provider returned it
    pub transcription: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error cause, passed through for the caller to display
    pub error: String,
}
