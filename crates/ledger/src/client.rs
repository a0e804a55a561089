use async_trait::async_trait;
use lojavoz_common::{LojavozError, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::auth::TokenProvider;
use crate::ledger_trait::Ledger;
use crate::types::{AppendRequest, ServiceAccountKey};

/// Spreadsheet values API base
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Current local time in the ledger's human-readable pt-BR format
pub fn current_timestamp() -> String {
    chrono::Local::now().format("%d/%m/%Y, %H:%M:%S").to_string()
}

/// Google Sheets append client
#[derive(Debug)]
pub struct SheetsClient {
    spreadsheet_id: String,
    range: String,
    client: Client,
    auth: TokenProvider,
}

impl SheetsClient {
    /// Create a client from the service-account credential JSON
    pub fn new(
        credentials_json: &str,
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
    ) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(credentials_json)
            .map_err(|e| LojavozError::config(format!("Invalid spreadsheet credential: {}", e)))?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        let auth = TokenProvider::new(key, client.clone());

        Ok(Self {
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
            client,
            auth,
        })
    }

    /// Append endpoint for the configured spreadsheet and range
    fn append_url(&self) -> String {
        format!(
            "{}/{}/values/{}:append",
            SHEETS_API_BASE, self.spreadsheet_id, self.range
        )
    }
}

#[async_trait]
impl Ledger for SheetsClient {
    async fn append_row(&self, store: &str, transcript: &str) -> Result<()> {
        let timestamp = current_timestamp();
        let body = AppendRequest {
            values: vec![vec![
                timestamp,
                store.to_string(),
                transcript.to_string(),
            ]],
        };

        debug!("Appending ledger row - Store: {}", store);

        let token = self.auth.access_token().await?;

        let response = self
            .client
            .post(self.append_url())
            .query(&[("valueInputOption", "USER_ENTERED")])
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| LojavozError::ledger(format!("Failed to send append request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LojavozError::ledger(format!(
                "Spreadsheet API error ({}): {}",
                status, error_text
            )));
        }

        info!("Ledger row appended - Store: {}", store);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn test_client() -> SheetsClient {
        let credentials = r#"{
            "client_email": "ledger@project.iam.gserviceaccount.com",
            "private_key": "pem",
            "token_uri": "https://oauth2.googleapis.com/token"
        }"#;
        SheetsClient::new(credentials, "sheet-id-123", "Sheet1!A:C").unwrap()
    }

    #[test]
    fn test_append_url() {
        let client = test_client();
        assert_eq!(
            client.append_url(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id-123/values/Sheet1!A:C:append"
        );
    }

    #[test]
    fn test_rejects_malformed_credentials() {
        let err = SheetsClient::new("{not json", "id", "Sheet1!A:C").unwrap_err();
        assert!(err.to_string().contains("Invalid spreadsheet credential"));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = current_timestamp();
        // dd/MM/yyyy, HH:mm:ss
        let parsed = NaiveDateTime::parse_from_str(&ts, "%d/%m/%Y, %H:%M:%S");
        assert!(parsed.is_ok(), "unexpected timestamp format: {}", ts);
    }

    #[test]
    fn test_timestamp_is_call_time() {
        let before = chrono::Local::now().naive_local();
        let ts = current_timestamp();
        let after = chrono::Local::now().naive_local();

        let parsed = NaiveDateTime::parse_from_str(&ts, "%d/%m/%Y, %H:%M:%S").unwrap();
        assert!(parsed >= before - chrono::Duration::seconds(2));
        assert!(parsed <= after + chrono::Duration::seconds(2));
    }
}
