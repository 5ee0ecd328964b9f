pub mod env;
mod entity;

pub use entity::{EntityKey, EntityKind, EntitySettings, EntityTarget};
pub use env::EnvOverrides;

use crate::auth::Credentials;
use crate::mapping::MappingTable;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

/// Read-only configuration consumed by the connector.
pub trait ConfigProvider: Send + Sync {
    fn credentials(&self) -> Credentials;
    fn default_host(&self) -> String;
    fn host_override(&self, entity: &EntityKey) -> Option<String>;
    /// Whether the entity has its own settings.
    fn has_entity(&self, entity: &EntityKey) -> bool;
    /// Identity table when the entity is unknown.
    fn mapping_table(&self, entity: &EntityKey) -> MappingTable;
    fn is_logging_enabled(&self) -> bool;
    fn is_api_disabled(&self) -> bool;
}

/// Complete settings file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorSettings {
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub keys: KeySettings,
    #[serde(default)]
    pub host: HostSettings,
    #[serde(default)]
    pub entities: BTreeMap<String, EntitySettings>,
}

/// Authentication scheme. Client id + tenant id is the only one supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    #[default]
    ClientTenantId,
}

/// Connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default)]
    pub connection_type: ConnectionType,
    /// Kill switch: no remote call is made while set.
    #[serde(default)]
    pub disable_api: bool,
    #[serde(default)]
    pub log_requests: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Shortest request timeout accepted; zero would fail every request.
pub const MIN_TIMEOUT_SECONDS: u64 = 1;

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_type: ConnectionType::default(),
            disable_api: false,
            log_requests: false,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Application credentials as stored in the settings file
#[derive(Clone, Default, Deserialize)]
pub struct KeySettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub tenant_id: String,
}

impl std::fmt::Debug for KeySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Default list URL
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostSettings {
    #[serde(default)]
    pub url: String,
}

/// Load settings from a TOML file
pub fn load_settings(path: impl AsRef<Path>) -> Result<ConnectorSettings> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings: ConnectorSettings = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("Invalid settings file {}", path.display()))?;
    Ok(settings)
}

impl ConnectorSettings {
    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.connection.timeout_seconds < MIN_TIMEOUT_SECONDS {
            anyhow::bail!(
                "connection.timeout_seconds must be at least {}",
                MIN_TIMEOUT_SECONDS
            );
        }
        Ok(())
    }
}

/// Like [`load_settings`], but a missing file yields default settings.
pub fn load_settings_or_default(path: impl AsRef<Path>) -> Result<ConnectorSettings> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Settings file not found, using defaults");
        return Ok(ConnectorSettings::default());
    }
    load_settings(path)
}

/// Resolved configuration: stored settings merged with deployment overrides.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    connection_type: ConnectionType,
    credentials: Credentials,
    default_host: String,
    entities: HashMap<EntityKey, EntityTarget>,
    log_requests: bool,
    disable_api: bool,
    request_timeout: Duration,
}

impl ConnectorConfig {
    /// Merge stored settings with overrides and build the per-entity lookups.
    pub fn resolve(settings: &ConnectorSettings, overrides: &EnvOverrides) -> Self {
        let credentials = Credentials {
            client_id: env::pick(overrides.client_id.as_ref(), &settings.keys.client_id),
            client_secret: env::pick(overrides.client_secret.as_ref(), &settings.keys.client_secret),
            tenant_id: env::pick(overrides.tenant_id.as_ref(), &settings.keys.tenant_id),
        };
        let default_host = env::pick(overrides.base_url.as_ref(), settings.host.url.trim());

        let entities: HashMap<EntityKey, EntityTarget> = settings
            .entities
            .iter()
            .map(|(key, entity)| {
                let target = EntityTarget::from(entity);
                tracing::debug!(
                    entity = %key,
                    kind = ?target.kind,
                    mapped_fields = target.mapping.len(),
                    has_host_override = target.host_override.is_some(),
                    "Entity configuration loaded"
                );
                (EntityKey::new(key.as_str()), target)
            })
            .collect();

        let timeout_seconds = settings.connection.timeout_seconds;
        if timeout_seconds < MIN_TIMEOUT_SECONDS {
            tracing::warn!(
                timeout_seconds,
                "Request timeout below minimum, using {}s",
                MIN_TIMEOUT_SECONDS
            );
        }

        Self {
            connection_type: settings.connection.connection_type,
            credentials,
            default_host,
            entities,
            log_requests: settings.connection.log_requests,
            disable_api: settings.connection.disable_api,
            request_timeout: Duration::from_secs(timeout_seconds.max(MIN_TIMEOUT_SECONDS)),
        }
    }

    /// Load the settings file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = load_settings_or_default(path)?;
        Ok(Self::resolve(&settings, &EnvOverrides::from_env()))
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.connection_type
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn entity(&self, key: &EntityKey) -> Option<&EntityTarget> {
        self.entities.get(key)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl ConfigProvider for ConnectorConfig {
    fn credentials(&self) -> Credentials {
        self.credentials.clone()
    }

    fn default_host(&self) -> String {
        self.default_host.clone()
    }

    fn host_override(&self, entity: &EntityKey) -> Option<String> {
        self.entities
            .get(entity)
            .and_then(|target| target.host_override.clone())
    }

    fn has_entity(&self, entity: &EntityKey) -> bool {
        self.entities.contains_key(entity)
    }

    fn mapping_table(&self, entity: &EntityKey) -> MappingTable {
        self.entities
            .get(entity)
            .map(|target| target.mapping.clone())
            .unwrap_or_default()
    }

    fn is_logging_enabled(&self) -> bool {
        self.log_requests
    }

    fn is_api_disabled(&self) -> bool {
        self.disable_api
    }
}
