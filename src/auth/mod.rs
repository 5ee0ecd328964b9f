//! OAuth 2.0 client-credentials authentication against Microsoft identity.
//!
//! The connector authenticates as itself (no end user) and receives a bearer
//! token used for every later request made by the same connector instance.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[cfg(test)]
mod tests;

pub const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
pub const GRAPH_RESOURCE: &str = "https://graph.microsoft.com/";
pub const TOKEN_API_VERSION: &str = "1.0";

/// Application credentials registered with the identity provider.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
}

impl Credentials {
    /// Name of the first empty credential, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.client_id.is_empty() {
            Some("client_id")
        } else if self.client_secret.is_empty() {
            Some("client_secret")
        } else if self.tenant_id.is_empty() {
            Some("tenant_id")
        } else {
            None
        }
    }
}

// The secret never reaches log output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Bearer token obtained from the identity endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub obtained_at: DateTime<Utc>,
}

impl AccessToken {
    /// Time since the token was issued.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.obtained_at
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Authentication failures. None of them leave a token behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
    #[error("token request failed: {0}")]
    Transport(String),
    #[error("token request returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("token response has no access_token")]
    MissingToken,
    #[error("failed to parse token response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// True when the failure comes from configuration rather than the network.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AuthError::MissingCredential(_))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Performs the client-credentials exchange.
///
/// Holds no token itself; the caller owns whatever it returns.
#[derive(Clone, Debug)]
pub struct TokenManager {
    http_client: Client,
    login_base_url: String,
}

impl TokenManager {
    /// Token manager for the public Microsoft login endpoint.
    pub fn new(http_client: Client) -> Self {
        Self::with_login_url(http_client, LOGIN_BASE_URL.to_string())
    }

    /// Token manager with a custom login base URL (for testing with a mock server).
    pub fn with_login_url(http_client: Client, login_base_url: String) -> Self {
        Self {
            http_client,
            login_base_url: login_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Token endpoint for a tenant.
    pub fn token_url(&self, tenant_id: &str) -> String {
        format!(
            "{}/{}/oauth2/token?api-version={}",
            self.login_base_url,
            urlencoding::encode(tenant_id),
            TOKEN_API_VERSION
        )
    }

    /// Exchange client credentials for a bearer token.
    ///
    /// Issues exactly one form-encoded POST. Only HTTP 200 with an
    /// `access_token` field counts as success.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        if let Some(field) = credentials.missing_field() {
            return Err(AuthError::MissingCredential(field));
        }

        let form = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("resource", GRAPH_RESOURCE),
            ("grant_type", "client_credentials"),
        ];

        let url = self.token_url(&credentials.tenant_id);
        tracing::debug!(tenant_id = %credentials.tenant_id, "Requesting client-credentials token");

        let response = self
            .http_client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status { status, body });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let value = token_response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        tracing::debug!("Client-credentials token acquired");

        Ok(AccessToken {
            value,
            obtained_at: Utc::now(),
        })
    }
}
