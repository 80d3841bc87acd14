//! User profile domain model — personal and contact attributes kept
//! out of the credential row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(value: &str) -> Option<Gender> {
        match value.trim() {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            "OTHER" => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub short_name: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub gender: Gender,
    pub tax_no: Option<String>,
    pub id_no: Option<String>,
    pub id_created_at: Option<DateTime<Utc>>,
    pub id_location: Option<String>,
    pub id_expired_at: Option<DateTime<Utc>>,
    pub phone_num: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub ref_name: Option<String>,
    pub ref_phone: Option<String>,
    pub ref_email: Option<String>,
    pub rep_name: Option<String>,
    pub rep_phone: Option<String>,
    pub rep_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserProfile {
    pub full_name: String,
    pub short_name: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub tax_no: Option<String>,
    pub id_no: Option<String>,
    pub id_created_at: Option<DateTime<Utc>>,
    pub id_location: Option<String>,
    pub id_expired_at: Option<DateTime<Utc>>,
    pub phone_num: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub ref_name: Option<String>,
    pub ref_phone: Option<String>,
    pub ref_email: Option<String>,
    pub rep_name: Option<String>,
    pub rep_phone: Option<String>,
    pub rep_email: Option<String>,
}

/// Partial profile update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserProfile {
    pub full_name: Option<String>,
    pub short_name: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub tax_no: Option<String>,
    pub id_no: Option<String>,
    pub id_created_at: Option<DateTime<Utc>>,
    pub id_location: Option<String>,
    pub id_expired_at: Option<DateTime<Utc>>,
    pub phone_num: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub ref_name: Option<String>,
    pub ref_phone: Option<String>,
    pub ref_email: Option<String>,
    pub rep_name: Option<String>,
    pub rep_phone: Option<String>,
    pub rep_email: Option<String>,
}
