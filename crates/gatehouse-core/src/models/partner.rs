//! Partner domain model — external partner accounts, parallel to
//! users but keyed by a generated `code` and carrying an `approved`
//! flag on top of `is_active`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: Uuid,
    /// Short unique partner code, generated at registration.
    pub code: String,
    pub email: String,
    /// Argon2id PHC-format hash.
    pub password: String,
    pub status: UserStatus,
    pub profile_id: Uuid,
    pub objective: Option<String>,
    pub level: i64,
    pub is_active: bool,
    pub approved: bool,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Partner {
    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
        self.is_active = status == UserStatus::Active;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePartner {
    pub code: String,
    pub email: String,
    pub password: String,
    pub status: UserStatus,
    pub profile_id: Uuid,
    pub objective: Option<String>,
    pub level: i64,
    pub is_active: bool,
    pub approved: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePartner {
    pub password: Option<String>,
    pub status: Option<UserStatus>,
    pub objective: Option<String>,
    pub level: Option<i64>,
    pub is_active: Option<bool>,
    pub approved: Option<bool>,
    pub deleted: Option<bool>,
    pub deleted_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub work_phone: Option<String>,
    pub role: Option<String>,
    pub org_name: Option<String>,
    pub org_work_phone: Option<String>,
    pub org_postal_code: Option<String>,
    pub org_address: Option<String>,
    pub org_city: Option<String>,
    pub org_country_code: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePartnerProfile {
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub work_phone: Option<String>,
    pub role: Option<String>,
    pub org_name: Option<String>,
    pub org_work_phone: Option<String>,
    pub org_postal_code: Option<String>,
    pub org_address: Option<String>,
    pub org_city: Option<String>,
    pub org_country_code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePartnerProfile {
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub work_phone: Option<String>,
    pub role: Option<String>,
    pub org_name: Option<String>,
    pub org_work_phone: Option<String>,
    pub org_postal_code: Option<String>,
    pub org_address: Option<String>,
    pub org_city: Option<String>,
    pub org_country_code: Option<String>,
    pub description: Option<String>,
}
