//! Deployment-level overrides read from the process environment.
//!
//! These take priority over values stored in the settings file, the same way
//! a deployment's own settings win over anything entered through an admin
//! screen.

pub const CLIENT_ID_VAR: &str = "SHAREPOINT_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SHAREPOINT_CLIENT_SECRET";
pub const TENANT_ID_VAR: &str = "SHAREPOINT_TENANT_ID";
pub const BASE_URL_VAR: &str = "SHAREPOINT_BASE_URL";

/// Values set by the deployment. `None` means "use the stored setting".
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
    pub base_url: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through an arbitrary lookup. Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            client_id: read(CLIENT_ID_VAR),
            client_secret: read(CLIENT_SECRET_VAR),
            tenant_id: read(TENANT_ID_VAR),
            base_url: read(BASE_URL_VAR),
        }
    }
}

impl std::fmt::Debug for EnvOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvOverrides")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("tenant_id", &self.tenant_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Stored value unless the override is set.
pub(crate) fn pick(override_value: Option<&String>, stored: &str) -> String {
    match override_value {
        Some(v) => v.clone(),
        None => stored.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup_ignores_empty() {
        let vars: HashMap<&str, &str> = [
            (CLIENT_ID_VAR, "env-client"),
            (CLIENT_SECRET_VAR, ""),
            (TENANT_ID_VAR, "   "),
        ]
        .into_iter()
        .collect();

        let overrides = EnvOverrides::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(overrides.client_id.as_deref(), Some("env-client"));
        assert_eq!(overrides.client_secret, None);
        assert_eq!(overrides.tenant_id, None);
        assert_eq!(overrides.base_url, None);
    }

    #[test]
    fn test_pick() {
        assert_eq!(pick(Some(&"env".to_string()), "stored"), "env");
        assert_eq!(pick(None, "stored"), "stored");
    }

    // The only test in the crate that touches the process environment.
    #[test]
    fn test_from_env() {
        std::env::set_var(BASE_URL_VAR, "https://env.example/list");
        std::env::remove_var(TENANT_ID_VAR);

        let overrides = EnvOverrides::from_env();
        assert_eq!(overrides.base_url.as_deref(), Some("https://env.example/list"));
        assert_eq!(overrides.tenant_id, None);

        std::env::remove_var(BASE_URL_VAR);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let overrides = EnvOverrides {
            client_secret: Some("s3cret".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", overrides).contains("s3cret"));
    }
}
