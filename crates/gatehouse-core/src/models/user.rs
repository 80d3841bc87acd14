//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Deactivated,
    Blocked,
    Deleted,
}

impl UserStatus {
    pub fn parse(value: &str) -> Option<UserStatus> {
        match value.trim() {
            "ACTIVE" => Some(UserStatus::Active),
            "DEACTIVATED" => Some(UserStatus::Deactivated),
            "BLOCKED" => Some(UserStatus::Blocked),
            "DELETED" => Some(UserStatus::Deleted),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Deactivated => "DEACTIVATED",
            UserStatus::Blocked => "BLOCKED",
            UserStatus::Deleted => "DELETED",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserType {
    Personal,
    Company,
}

impl UserType {
    pub fn parse(value: &str) -> Option<UserType> {
        match value.trim() {
            "PERSONAL" => Some(UserType::Personal),
            "COMPANY" => Some(UserType::Company),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Personal => "PERSONAL",
            UserType::Company => "COMPANY",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountType {
    Merchant,
    Eu,
}

impl AccountType {
    pub fn parse(value: &str) -> Option<AccountType> {
        match value.trim() {
            "MERCHANT" => Some(AccountType::Merchant),
            "EU" => Some(AccountType::Eu),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Merchant => "MERCHANT",
            AccountType::Eu => "EU",
        }
    }
}

/// Key under `User::data` holding the encrypted directory credential
/// blob.
pub const LDAP_INFO_KEY: &str = "ldap_info";
/// Key under `User::data` holding downstream cloud-project details.
pub const OS_INFO_KEY: &str = "os_info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Lower-cased, trimmed, globally unique (also against e-mails).
    pub user_name: String,
    /// Lower-cased, trimmed, globally unique (also against names).
    pub email: String,
    /// Argon2id PHC-format hash.
    pub password: String,
    pub status: UserStatus,
    pub user_type: UserType,
    pub account_type: AccountType,
    pub role: Role,
    pub level: i64,
    pub group_id: Uuid,
    pub profile_id: Uuid,
    /// Invariant: `is_active == (status == Active)`.
    pub is_active: bool,
    /// Opaque per-user blob; see [`LDAP_INFO_KEY`] / [`OS_INFO_KEY`].
    pub data: serde_json::Value,
    pub last_login: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency version; bumped on every committed
    /// update.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Set the status and keep `is_active` in sync with it.
    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
        self.is_active = status == UserStatus::Active;
    }

    pub fn data_get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.as_object().and_then(|map| map.get(key))
    }

    pub fn data_set(&mut self, key: &str, value: serde_json::Value) {
        if !self.data.is_object() {
            self.data = serde_json::Value::Object(Default::default());
        }
        if let Some(map) = self.data.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }

    pub fn data_remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.as_object_mut().and_then(|map| map.remove(key))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub user_name: String,
    pub email: String,
    /// Argon2id PHC-format hash; hashing happens in the workflow
    /// layer so the store never sees a plaintext password.
    pub password: String,
    pub status: UserStatus,
    pub user_type: UserType,
    pub account_type: AccountType,
    pub role: Role,
    pub level: i64,
    pub group_id: Uuid,
    pub profile_id: Uuid,
    pub is_active: bool,
    pub data: Option<serde_json::Value>,
}

/// Partial update, applied field-by-field. `None` means "leave
/// unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub password: Option<String>,
    pub status: Option<UserStatus>,
    pub user_type: Option<UserType>,
    pub account_type: Option<AccountType>,
    pub role: Option<Role>,
    pub level: Option<i64>,
    pub group_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub data: Option<serde_json::Value>,
    pub last_login: Option<DateTime<Utc>>,
    pub deleted: Option<bool>,
    pub deleted_at: Option<Option<DateTime<Utc>>>,
}
