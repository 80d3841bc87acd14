//! User group domain model — a named bucket carrying a permission
//! set. New users land in a configured default group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGroup {
    pub id: Uuid,
    pub name: String,
    pub group_type: Option<String>,
    pub description: Option<String>,
    pub permissions: serde_json::Value,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserGroup {
    pub name: String,
    pub group_type: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<serde_json::Value>,
    pub status: bool,
}
