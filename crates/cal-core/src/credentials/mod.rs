//! Credential handling for acting on the user's behalf
//!
//! The gateway never manages credential storage itself; it carries an
//! opaque [`CredentialRef`] attached to an intent and asks a
//! [`CredentialProvider`] for a usable access token right before talking
//! to the calendar service.

mod oauth;

pub use oauth::OAuthTokenProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Token material needed to act on the user's behalf
///
/// Opaque to the state machine; only the credential provider looks inside.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// When the access token stops being valid, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialRef {
    /// Credential carrying a bare access token
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Default::default()
        }
    }

    /// Whether the access token is known to be expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= Utc::now(),
            None => false,
        }
    }

    /// Read token material from `CALENDAR_ACCESS_TOKEN`,
    /// `CALENDAR_REFRESH_TOKEN`, `CALENDAR_CLIENT_ID` and
    /// `CALENDAR_CLIENT_SECRET` (used by the CLI chat mode)
    pub fn from_env() -> Self {
        Self {
            access_token: std::env::var("CALENDAR_ACCESS_TOKEN").ok(),
            refresh_token: std::env::var("CALENDAR_REFRESH_TOKEN").ok(),
            client_id: std::env::var("CALENDAR_CLIENT_ID").ok(),
            client_secret: std::env::var("CALENDAR_CLIENT_SECRET").ok(),
            expires_at: None,
        }
    }
}

/// Supplies a valid access token for a credential reference
///
/// Implementations may refresh behind the scenes; callers only observe a
/// token or a credential failure.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return an access token that is valid right now
    async fn get_valid_token(&self, credentials: &CredentialRef) -> Result<String>;
}

/// Provider that hands back one fixed token (tests, pre-authorized wiring)
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn get_valid_token(&self, _credentials: &CredentialRef) -> Result<String> {
        Ok(self.token.clone())
    }
}
