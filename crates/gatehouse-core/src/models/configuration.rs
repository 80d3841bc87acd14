//! Versioned configuration records, keyed by (type, name, version).
//!
//! Feature settings that are data rather than process configuration
//! live here — notably the directory backend settings consumed by the
//! provisioning client. Lookups take the highest-version enabled row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigType {
    App,
    Compute,
    Network,
    Backend,
}

impl ConfigType {
    pub fn parse(value: &str) -> Option<ConfigType> {
        match value.trim() {
            "APP" => Some(ConfigType::App),
            "COMPUTE" => Some(ConfigType::Compute),
            "NETWORK" => Some(ConfigType::Network),
            "BACKEND" => Some(ConfigType::Backend),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigType::App => "APP",
            ConfigType::Compute => "COMPUTE",
            ConfigType::Network => "NETWORK",
            ConfigType::Backend => "BACKEND",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub id: Uuid,
    pub config_type: ConfigType,
    pub name: String,
    pub version: i64,
    /// Disabled rows are ignored by lookups.
    pub status: bool,
    pub contents: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConfiguration {
    pub config_type: ConfigType,
    pub name: String,
    pub version: i64,
    pub status: bool,
    pub contents: serde_json::Value,
}
