use crate::error::LojavozError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Spreadsheet the original deployment appends to; override with SPREADSHEET_ID.
const DEFAULT_SPREADSHEET_ID: &str = "1sZumguCoCt_OnlqvqaWMPe-qzezbv3fy_YCFCLg3WZ8";

/// Lojavoz application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Transcription provider API key
    pub openai_api_key: String,

    /// Transcription model name
    pub whisper_model: String,

    /// Language hint sent with every transcription request
    pub language: String,

    /// Service-account credential as inline JSON
    pub google_credentials: Option<String>,

    /// Path to a mounted service-account credential file
    pub google_credentials_file: Option<PathBuf>,

    /// Target spreadsheet identifier
    pub spreadsheet_id: String,

    /// Target cell range for appends
    pub sheet_range: String,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Directory for transient audio files
    pub upload_dir: PathBuf,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            whisper_model: "whisper-1".to_string(),
            language: "pt".to_string(),
            google_credentials: None,
            google_credentials_file: None,
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            sheet_range: "Sheet1!A:C".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            upload_dir: PathBuf::from("./uploads"),
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, LojavozError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let config = Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            whisper_model: std::env::var("WHISPER_MODEL")
                .unwrap_or_else(|_| "whisper-1".to_string()),
            language: std::env::var("LANGUAGE").unwrap_or_else(|_| "pt".to_string()),
            google_credentials: std::env::var("GOOGLE_CREDENTIALS").ok(),
            google_credentials_file: Self::get_env_path("GOOGLE_CREDENTIALS_FILE"),
            spreadsheet_id: std::env::var("SPREADSHEET_ID")
                .unwrap_or_else(|_| DEFAULT_SPREADSHEET_ID.to_string()),
            sheet_range: std::env::var("SHEET_RANGE")
                .unwrap_or_else(|_| "Sheet1!A:C".to_string()),
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            upload_dir: Self::get_env_path("UPLOAD_DIR")
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or_else(|| PathBuf::from("./log")),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), LojavozError> {
        let dirs = vec![&self.upload_dir, &self.log_dir];

        for dir in dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    LojavozError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Resolve the service-account credential: inline JSON wins over a mounted file
    pub fn resolve_google_credentials(&self) -> Result<String, LojavozError> {
        if let Some(inline) = &self.google_credentials {
            return Ok(inline.clone());
        }

        if let Some(path) = &self.google_credentials_file {
            return std::fs::read_to_string(path).map_err(|e| {
                LojavozError::config(format!(
                    "Failed to read credential file {}: {}",
                    path.display(),
                    e
                ))
            });
        }

        Err(LojavozError::config(
            "No spreadsheet credential: set GOOGLE_CREDENTIALS or GOOGLE_CREDENTIALS_FILE",
        ))
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), LojavozError> {
        if self.openai_api_key.is_empty() {
            return Err(LojavozError::config("OPENAI_API_KEY cannot be empty"));
        }

        if self.google_credentials.is_none() && self.google_credentials_file.is_none() {
            return Err(LojavozError::config(
                "Set GOOGLE_CREDENTIALS or GOOGLE_CREDENTIALS_FILE",
            ));
        }

        if self.spreadsheet_id.is_empty() {
            return Err(LojavozError::config("Spreadsheet ID cannot be empty"));
        }

        if self.server_port == 0 {
            return Err(LojavozError::config("Server port cannot be 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.whisper_model, "whisper-1");
        assert_eq!(config.language, "pt");
        assert_eq!(config.sheet_range, "Sheet1!A:C");
    }

    #[test]
    fn test_server_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.server_bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        config.openai_api_key = "sk-test".to_string();
        config.google_credentials = Some("{}".to_string());
        assert!(config.validate().is_ok());

        config.openai_api_key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_credentials_prefers_inline() {
        let mut config = AppConfig::default();
        config.google_credentials = Some("{\"client_email\":\"a@b\"}".to_string());
        config.google_credentials_file = Some(PathBuf::from("/nonexistent.json"));

        let resolved = config.resolve_google_credentials().unwrap();
        assert!(resolved.contains("client_email"));
    }

    #[test]
    fn test_resolve_credentials_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa.json");
        std::fs::write(&path, "{\"client_email\":\"svc@proj\"}").unwrap();

        let mut config = AppConfig::default();
        config.google_credentials_file = Some(path);

        let resolved = config.resolve_google_credentials().unwrap();
        assert!(resolved.contains("svc@proj"));
    }

    #[test]
    fn test_resolve_credentials_missing() {
        let config = AppConfig::default();
        assert!(config.resolve_google_credentials().is_err());
    }
}
