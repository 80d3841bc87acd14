//! Directory backend settings.
//!
//! These are data, not process configuration: they live in the
//! `configuration` table under (BACKEND, "ldap_config") and the
//! highest-version enabled row wins.

use std::time::Duration;

use gatehouse_core::error::{GateError, GateResult};
use gatehouse_core::models::configuration::ConfigType;
use gatehouse_core::repository::ConfigurationRepository;
use serde::{Deserialize, Serialize};

/// Configuration record name for the directory backend.
pub const DIRECTORY_CONFIG_NAME: &str = "ldap_config";

fn default_user_ou() -> String {
    "Users".into()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySettings {
    /// When false, provisioning is skipped entirely.
    pub enabled: bool,
    /// Directory endpoint URL.
    pub url: String,
    /// Base domain component, e.g. `dc=example,dc=com`.
    pub dc: String,
    /// OU under which user entries are created.
    #[serde(default = "default_user_ou")]
    pub user_ou: String,
    /// Service account CN used for administrative binds.
    pub cn: String,
    /// Service account password.
    pub password: String,
    /// Optional group CN new cloud accounts are added to.
    #[serde(default)]
    pub group_cn: Option<String>,
    /// Connection-readiness deadline.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl DirectorySettings {
    pub fn from_contents(contents: &serde_json::Value) -> GateResult<Self> {
        serde_json::from_value(contents.clone()).map_err(|e| GateError::Validation {
            message: format!("malformed {DIRECTORY_CONFIG_NAME} record: {e}"),
        })
    }

    /// Load the active settings from the store. `Ok(None)` means the
    /// backend is present but disabled; a missing record is a
    /// configuration error.
    pub async fn load<S: ConfigurationRepository>(store: &S) -> GateResult<Option<Self>> {
        let record = store
            .latest_configuration(ConfigType::Backend, DIRECTORY_CONFIG_NAME)
            .await?
            .ok_or_else(|| GateError::ConfigNotFound {
                name: format!("BACKEND/{DIRECTORY_CONFIG_NAME}"),
            })?;

        let settings = Self::from_contents(&record.contents)?;
        if !settings.enabled {
            return Ok(None);
        }
        Ok(Some(settings))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// DN the service account binds with.
    pub fn service_bind_dn(&self) -> String {
        format!("cn={},{}", self.cn, self.dc)
    }

    /// Base DN under which user entries are created.
    pub fn user_base(&self) -> String {
        format!("ou={},{}", self.user_ou, self.dc)
    }

    /// DN of the configured provisioning group, when set.
    pub fn group_dn(&self) -> Option<String> {
        self.group_cn
            .as_ref()
            .map(|cn| format!("cn={cn},ou=Groups,{}", self.dc))
    }
}

/// The decrypted credential tuple mirrored into `User::data` under
/// `ldap_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryCredentials {
    pub dc: String,
    pub ou: String,
    pub cn: String,
    pub password: String,
}

impl DirectoryCredentials {
    pub fn dn(&self) -> String {
        format!("cn={},ou={},{}", self.cn, self.ou, self.dc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_parse_with_defaults() {
        let contents = json!({
            "enabled": true,
            "url": "ldap://127.0.0.1:389",
            "dc": "dc=example,dc=com",
            "cn": "admin",
            "password": "svc-secret",
        });
        let settings = DirectorySettings::from_contents(&contents).unwrap();
        assert_eq!(settings.user_ou, "Users");
        assert_eq!(settings.connect_timeout_secs, 10);
        assert_eq!(settings.service_bind_dn(), "cn=admin,dc=example,dc=com");
        assert_eq!(settings.user_base(), "ou=Users,dc=example,dc=com");
        assert_eq!(settings.group_dn(), None);
    }

    #[test]
    fn malformed_settings_are_a_typed_error() {
        let err = DirectorySettings::from_contents(&json!({"enabled": true})).unwrap_err();
        assert!(matches!(err, GateError::Validation { .. }));
    }

    #[test]
    fn credential_dn_shape() {
        let creds = DirectoryCredentials {
            dc: "dc=example,dc=com".into(),
            ou: "Users".into(),
            cn: "alice".into(),
            password: "pw".into(),
        };
        assert_eq!(creds.dn(), "cn=alice,ou=Users,dc=example,dc=com");
    }
}
