use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use lojavoz_common::{LojavozError, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::types::{GrantClaims, ServiceAccountKey, TokenResponse};

/// Scope required to append spreadsheet rows
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Grant lifetime requested in the signed JWT
const GRANT_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Mints and caches bearer tokens for the spreadsheet scope via the
/// service-account signed-JWT grant
#[derive(Debug)]
pub struct TokenProvider {
    key: ServiceAccountKey,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a provider from a parsed service-account key
    pub fn new(key: ServiceAccountKey, client: Client) -> Self {
        Self {
            key,
            client,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid bearer token, minting a new one when the cache is
    /// empty or near expiry
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let assertion = self.sign_grant()?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LojavozError::ledger(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LojavozError::ledger(format!(
                "Token endpoint error ({}): {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| LojavozError::ledger(format!("Failed to parse token response: {}", e)))?;

        debug!("Minted spreadsheet token, expires in {}s", token.expires_in);

        let lifetime = token.expires_in.saturating_sub(EXPIRY_MARGIN_SECS);
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });

        Ok(token.access_token)
    }

    /// Build and sign the JWT grant assertion
    fn sign_grant(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = GrantClaims {
            iss: self.key.client_email.clone(),
            scope: SPREADSHEETS_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + GRANT_LIFETIME_SECS,
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| LojavozError::ledger(format!("Invalid service-account key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| LojavozError::ledger(format!("Failed to sign grant: {}", e)))
    }
}
