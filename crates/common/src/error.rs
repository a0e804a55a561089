/// Lojavoz error types
#[derive(Debug, thiserror::Error)]
pub enum LojavozError {
    /// Transcription provider error
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Spreadsheet ledger error
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LojavozError {
    /// Create transcription error
    pub fn transcription<S: Into<String>>(msg: S) -> Self {
        Self::Transcription(msg.into())
    }

    /// Create ledger error
    pub fn ledger<S: Into<String>>(msg: S) -> Self {
        Self::Ledger(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create file system error
    pub fn file_system<S: Into<String>>(msg: S) -> Self {
        Self::FileSystem(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

// HTTP response conversion
impl LojavozError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Transcription(_) => 500,
            Self::Ledger(_) => 500,
            Self::Config(_) => 500,
            Self::FileSystem(_) => 500,
            Self::Internal(_) => 500,
            Self::Io(_) => 500,
            Self::Json(_) => 500,
            Self::Other(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(LojavozError::invalid_input("no file").status_code(), 400);
        assert_eq!(LojavozError::transcription("api down").status_code(), 500);
        assert_eq!(LojavozError::ledger("quota").status_code(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = LojavozError::transcription("API error (401): bad key");
        assert_eq!(err.to_string(), "Transcription error: API error (401): bad key");
    }
}
