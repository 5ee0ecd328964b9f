use crate::mapping::MappingTable;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Stable identifier of a content type or webform.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an entity's records come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    ContentType,
    Webform,
}

/// Per-entity settings as stored in the settings file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EntitySettings {
    #[serde(default)]
    pub kind: EntityKind,
    /// List URL used instead of the default host. Empty means unset.
    #[serde(default)]
    pub host: Option<String>,
    /// When present, only these source fields keep their mapping.
    #[serde(default)]
    pub enabled_fields: Option<Vec<String>>,
    /// Source field -> destination column. Non-string values are ignored.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Typed view of an entity, built once at load time.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityTarget {
    pub kind: EntityKind,
    pub host_override: Option<String>,
    pub mapping: MappingTable,
}

impl From<&EntitySettings> for EntityTarget {
    fn from(settings: &EntitySettings) -> Self {
        let mut mapping = MappingTable::from_json_object(&settings.fields);
        if let Some(enabled) = &settings.enabled_fields {
            mapping.retain(|source| enabled.iter().any(|field| field == source));
        }

        let host_override = settings
            .host
            .as_ref()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(str::to_string);

        Self {
            kind: settings.kind,
            host_override,
            mapping,
        }
    }
}
