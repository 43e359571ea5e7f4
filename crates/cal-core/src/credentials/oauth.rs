//! OAuth refresh-token grant provider

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CredentialProvider, CredentialRef};
use crate::error::{Error, Result};

/// Credential provider backed by an OAuth token endpoint
///
/// Returns the attached access token while it is still valid; once it has
/// expired, performs a single refresh-token grant. No retry on failure.
pub struct OAuthTokenProvider {
    client: Client,
    token_uri: String,
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl OAuthTokenProvider {
    /// Create a provider against the given token endpoint
    pub fn new(token_uri: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            token_uri: token_uri.into(),
        })
    }

    async fn refresh(&self, credentials: &CredentialRef) -> Result<String> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            credentials.refresh_token.as_deref(),
            credentials.client_id.as_deref(),
            credentials.client_secret.as_deref(),
        ) else {
            return Err(Error::Credential(
                "access token expired and no refresh material attached".to_string(),
            ));
        };

        debug!("Refreshing access token via {}", self.token_uri);

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        let response = self
            .client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Credential(format!("token refresh request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Credential(format!("token refresh request failed: {}", e)))?;

        if !status.is_success() {
            warn!("Token refresh rejected: {} - {}", status, body);
            return Err(Error::Credential(format!(
                "token refresh rejected ({}): {}",
                status, body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Credential(format!("malformed token response: {}", e)))?;

        Ok(parsed.access_token)
    }
}

#[async_trait]
impl CredentialProvider for OAuthTokenProvider {
    async fn get_valid_token(&self, credentials: &CredentialRef) -> Result<String> {
        if let Some(token) = &credentials.access_token {
            if !credentials.is_expired() {
                return Ok(token.clone());
            }
        }

        self.refresh(credentials).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_unexpired_token_without_refresh() {
        let provider = OAuthTokenProvider::new("https://oauth.invalid/token").unwrap();
        let token = provider
            .get_valid_token(&CredentialRef::bearer("still-good"))
            .await
            .unwrap();
        assert_eq!(token, "still-good");
    }

    #[tokio::test]
    async fn test_expired_without_refresh_material_fails() {
        let provider = OAuthTokenProvider::new("https://oauth.invalid/token").unwrap();
        let creds = CredentialRef {
            access_token: Some("stale".to_string()),
            expires_at: Some(chrono::Utc::now() - chrono::Duration::minutes(5)),
            ..Default::default()
        };

        let err = provider.get_valid_token(&creds).await.unwrap_err();
        assert!(matches!(err, Error::Credential(_)));
    }

    #[tokio::test]
    async fn test_no_token_material_at_all_fails() {
        let provider = OAuthTokenProvider::new("https://oauth.invalid/token").unwrap();
        let err = provider
            .get_valid_token(&CredentialRef::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Credential(_)));
    }
}
