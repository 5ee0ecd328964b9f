//! Entry submission to a SharePoint list.
//!
//! A [`SharepointConnector`] maps a record, makes sure it holds a bearer token,
//! and posts the mapped record to the resolved list URL. One instance serves
//! one submission context: it owns its token slot and must not be shared.

use crate::auth::{AccessToken, AuthError, TokenManager};
use crate::config::ConfigProvider;
use crate::diagnostics::{Diagnostics, DiagnosticsSink};
use crate::mapping::{prepare_fields, MappingTable, Record};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;


/// Outcome of one submission. Every failure is terminal; nothing is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionResult {
    /// The list answered 201 Created.
    Success,
    /// No token could be obtained; nothing was sent to the list.
    AuthFailed(String),
    /// The list answered with a status other than 201.
    HttpError { status: u16, body: String },
    /// The list request never completed (connection failure, timeout).
    TransportError(String),
    /// A credential or the target URL is missing; nothing was sent.
    ConfigError(String),
    /// API calls are switched off in configuration; nothing was sent.
    Disabled,
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Success)
    }
}

/// Build the HTTP client shared by connector instances.
///
/// The client only pools connections; tokens live in each connector.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent("sharepoint-connector/0.1")
        .timeout(timeout)
        .build()
}

/// Connector for one submission context.
pub struct SharepointConnector {
    config: Arc<dyn ConfigProvider>,
    diagnostics: Diagnostics,
    http_client: Client,
    token_manager: TokenManager,
    token: Option<AccessToken>,
}

impl SharepointConnector {
    /// Create a connector authenticating against the public Microsoft login endpoint.
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        sink: Arc<dyn DiagnosticsSink>,
        http_client: Client,
    ) -> Self {
        let token_manager = TokenManager::new(http_client.clone());
        Self::with_token_manager(config, sink, http_client, token_manager)
    }

    /// Create a connector with a custom token manager (for testing with a mock server).
    pub fn with_token_manager(
        config: Arc<dyn ConfigProvider>,
        sink: Arc<dyn DiagnosticsSink>,
        http_client: Client,
        token_manager: TokenManager,
    ) -> Self {
        let diagnostics = Diagnostics::new(sink, config.is_logging_enabled());
        Self {
            config,
            diagnostics,
            http_client,
            token_manager,
            token: None,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Whether this instance already holds a token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Map `record` and create it as a new list entry.
    ///
    /// The target is `target_url_override` when non-empty, otherwise the
    /// configured default host.
    pub async fn submit_entry(
        &mut self,
        record: &Record,
        mapping: &MappingTable,
        target_url_override: Option<&str>,
    ) -> SubmissionResult {
        if self.config.is_api_disabled() {
            self.diagnostics
                .warning("SharePoint API calls are disabled; entry not sent.");
            return SubmissionResult::Disabled;
        }

        let envelope = prepare_fields(record, mapping);

        let Some(url) = self.resolve_target(target_url_override) else {
            let message = "No SharePoint host URL configured".to_string();
            self.diagnostics.error(&format!("ERROR from SharePoint connector - {}.", message));
            return SubmissionResult::ConfigError(message);
        };

        let token = match self.ensure_token().await {
            Ok(token) => token,
            Err(e) if e.is_configuration() => {
                self.diagnostics
                    .error(&format!("ERROR from SharePoint connector - {}.", e));
                return SubmissionResult::ConfigError(e.to_string());
            }
            Err(e) => {
                self.diagnostics.error(&format!(
                    "ERROR from SharePoint connector - Authentication failed: {}",
                    e
                ));
                return SubmissionResult::AuthFailed(e.to_string());
            }
        };

        tracing::debug!(url = %url, fields = envelope.fields.len(), "Posting entry");

        let response = match self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(&envelope)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.diagnostics
                    .error(&format!("ERROR from SharePoint connector - {}", e));
                return SubmissionResult::TransportError(e.to_string());
            }
        };

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "List responded");

        if status == StatusCode::CREATED {
            return SubmissionResult::Success;
        }

        let body = response.text().await.unwrap_or_default();
        self.diagnostics.error(&format!(
            "ERROR from SharePoint connector - Request didn't return a 201 (status {}).",
            status.as_u16()
        ));
        SubmissionResult::HttpError {
            status: status.as_u16(),
            body,
        }
    }

    fn resolve_target(&self, target_url_override: Option<&str>) -> Option<String> {
        target_url_override
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .or_else(|| {
                let default_host = self.config.default_host();
                let default_host = default_host.trim();
                (!default_host.is_empty()).then(|| default_host.to_string())
            })
    }

    /// Token for this instance, authenticating on first use.
    async fn ensure_token(&mut self) -> Result<String, AuthError> {
        if let Some(token) = &self.token {
            tracing::debug!(
                token_age_secs = token.age().num_seconds(),
                "Reusing access token"
            );
            return Ok(token.value.clone());
        }

        let token = self
            .token_manager
            .authenticate(&self.config.credentials())
            .await?;
        let value = token.value.clone();
        self.token = Some(token);
        Ok(value)
    }
}
