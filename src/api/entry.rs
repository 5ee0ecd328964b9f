//! `POST /api/sharepoint/entry` - push an inbound record to SharePoint.

use crate::auth::TokenManager;
use crate::config::{ConfigProvider, EntityKey};
use crate::diagnostics::DiagnosticsSink;
use crate::mapping::{MappingTable, Record};
use crate::submit::{SharepointConnector, SubmissionResult};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Field stripped from every inbound payload before submission.
pub const METATAG_FIELD: &str = "metatag";

/// Shared state for the entry endpoint.
///
/// Holds no token: every request builds its own connector instance.
#[derive(Clone)]
pub struct EntryAppState {
    pub config: Arc<dyn ConfigProvider>,
    pub sink: Arc<dyn DiagnosticsSink>,
    pub http_client: Client,
    /// Login base URL override (mock identity endpoint in tests).
    pub login_base_url: Option<String>,
}

impl EntryAppState {
    fn connector(&self) -> SharepointConnector {
        let config = Arc::clone(&self.config);
        let sink = Arc::clone(&self.sink);
        match &self.login_base_url {
            Some(url) => SharepointConnector::with_token_manager(
                config,
                sink,
                self.http_client.clone(),
                TokenManager::with_login_url(self.http_client.clone(), url.clone()),
            ),
            None => SharepointConnector::new(config, sink, self.http_client.clone()),
        }
    }
}

/// Response body for the entry endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntryOutcome {
    pub created: bool,
    /// `None` when the payload was empty and nothing was submitted.
    #[serde(skip)]
    pub result: Option<SubmissionResult>,
}

impl EntryOutcome {
    fn not_found() -> Self {
        Self {
            created: false,
            result: None,
        }
    }
}

impl IntoResponse for EntryOutcome {
    fn into_response(self) -> Response {
        let status = if self.created {
            StatusCode::CREATED
        } else {
            StatusCode::NOT_FOUND
        };
        (status, Json(self)).into_response()
    }
}

/// A record and the entity it belongs to, if known.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundEntry {
    pub entity: Option<EntityKey>,
    pub record: Record,
}

impl InboundEntry {
    /// Split a payload into entity key and record.
    ///
    /// `{"article": {...}}` is an entity-keyed payload: the single top-level key
    /// names the entity and its object is the record. Anything else is a flat
    /// record.
    pub fn from_payload(payload: Record) -> Self {
        if payload.len() == 1 {
            if let Some((key, Value::Object(record))) = payload.iter().next() {
                return Self {
                    entity: Some(EntityKey::new(key.as_str())),
                    record: record.clone(),
                };
            }
        }
        Self {
            entity: None,
            record: payload,
        }
    }
}

/// Parse the request body into a payload with non-transmittable fields removed.
///
/// A missing, malformed, or non-object body yields an empty payload.
pub fn build_payload(body: &[u8]) -> Record {
    let mut payload = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Record::new(),
    };
    payload.remove(METATAG_FIELD);
    payload
}

/// Create router with the entry endpoint
pub fn create_entry_router(state: EntryAppState) -> Router {
    Router::new()
        .route("/api/sharepoint/entry", post(post_entry))
        .with_state(Arc::new(state))
}

/// POST /api/sharepoint/entry
async fn post_entry(State(state): State<Arc<EntryAppState>>, body: Bytes) -> EntryOutcome {
    let payload = build_payload(&body);
    handle_post_entry(&state, payload).await
}

/// Submits one inbound payload.
///
/// An empty payload short-circuits to "not found" without any remote call.
pub async fn handle_post_entry(state: &EntryAppState, payload: Record) -> EntryOutcome {
    if payload.is_empty() {
        debug!("Empty payload, nothing to submit");
        return EntryOutcome::not_found();
    }

    let entry = InboundEntry::from_payload(payload);
    let (mapping, host_override) = match &entry.entity {
        Some(entity) => {
            if !state.config.has_entity(entity) {
                debug!(
                    entity = %entity,
                    "Entity not configured, sending its record unmapped to the default host"
                );
            }
            (
                state.config.mapping_table(entity),
                state.config.host_override(entity),
            )
        }
        None => (MappingTable::default(), None),
    };

    debug!(
        entity = entry.entity.as_ref().map(EntityKey::as_str).unwrap_or("-"),
        fields = entry.record.len(),
        mapped_fields = mapping.len(),
        "Submitting entry"
    );

    let mut connector = state.connector();
    let result = connector
        .submit_entry(&entry.record, &mapping, host_override.as_deref())
        .await;

    let diagnostics = connector.diagnostics();
    let created = result.is_success();
    if created {
        diagnostics.info("Entry successfully posted to SharePoint.");
    } else {
        diagnostics.warning("Failed to post entry to SharePoint.");
    }

    EntryOutcome {
        created,
        result: Some(result),
    }
}
