//! Repository trait definitions for the identity store abstraction.
//!
//! All operations are async and never panic on expected failure
//! modes: lookups return `Ok(None)` for absent rows, and commit or
//! integrity failures surface as typed [`GateError`]s
//! (`CommitFailed`, `AlreadyExists`, `UpdateConflict`).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GateResult;
use crate::models::{
    configuration::{ConfigType, Configuration, CreateConfiguration},
    group::{CreateUserGroup, UserGroup},
    partner::{
        CreatePartner, CreatePartnerProfile, Partner, PartnerProfile, UpdatePartner,
        UpdatePartnerProfile,
    },
    profile::{CreateUserProfile, UpdateUserProfile, UserProfile},
    user::{CreateUser, UpdateUser, User},
};

/// Marker-based keyset pagination request.
///
/// The store fetches `limit + 1` rows ordered by primary key starting
/// after `marker`; when the extra row exists it is stripped and
/// reported as the next marker.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub limit: u64,
    pub marker: Option<Uuid>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { limit: 50, marker: None }
    }
}

/// One page of a keyset-paginated result set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present iff more rows follow; pass back as the next marker.
    pub next_marker: Option<Uuid>,
}

pub trait UserRepository: Send + Sync {
    fn create_user(&self, input: CreateUser) -> impl Future<Output = GateResult<User>> + Send;

    fn get_user(&self, id: Uuid) -> impl Future<Output = GateResult<Option<User>>> + Send;

    /// Case-insensitive lookup matching either `user_name` or `email`
    /// in a single query.
    fn find_user_by_name_or_email(
        &self,
        identifier: &str,
    ) -> impl Future<Output = GateResult<Option<User>>> + Send;

    /// Accepts a UUID (tried first) or a name/e-mail identifier.
    fn find_user(&self, identifier: &str) -> impl Future<Output = GateResult<Option<User>>> + Send;

    /// Uniqueness probe: true when any candidate matches an existing
    /// `user_name` *or* `email`.
    fn user_name_or_email_taken(
        &self,
        candidates: &[String],
    ) -> impl Future<Output = GateResult<bool>> + Send;

    /// Versioned partial update. Fails with `UpdateConflict` when
    /// `expected_version` no longer matches the stored row.
    fn update_user(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateUser,
    ) -> impl Future<Output = GateResult<User>> + Send;

    /// Hard delete. Soft deletion is an ordinary update of the
    /// status/deleted fields.
    fn delete_user(&self, id: Uuid) -> impl Future<Output = GateResult<()>> + Send;

    fn list_users(&self, page: PageRequest) -> impl Future<Output = GateResult<Page<User>>> + Send;

    /// Remove soft-deleted users whose `deleted_at` precedes the
    /// cutoff. Returns the number of purged rows.
    fn purge_deleted_users(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = GateResult<u64>> + Send;
}

pub trait UserProfileRepository: Send + Sync {
    fn create_profile(
        &self,
        input: CreateUserProfile,
    ) -> impl Future<Output = GateResult<UserProfile>> + Send;

    fn get_profile(&self, id: Uuid)
    -> impl Future<Output = GateResult<Option<UserProfile>>> + Send;

    fn update_profile(
        &self,
        id: Uuid,
        input: UpdateUserProfile,
    ) -> impl Future<Output = GateResult<UserProfile>> + Send;

    fn delete_profile(&self, id: Uuid) -> impl Future<Output = GateResult<()>> + Send;
}

pub trait UserGroupRepository: Send + Sync {
    fn create_group(
        &self,
        input: CreateUserGroup,
    ) -> impl Future<Output = GateResult<UserGroup>> + Send;

    fn get_group(&self, id: Uuid) -> impl Future<Output = GateResult<Option<UserGroup>>> + Send;

    fn list_groups(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = GateResult<Page<UserGroup>>> + Send;
}

pub trait PartnerRepository: Send + Sync {
    fn create_partner(
        &self,
        input: CreatePartner,
    ) -> impl Future<Output = GateResult<Partner>> + Send;

    fn get_partner(&self, id: Uuid) -> impl Future<Output = GateResult<Option<Partner>>> + Send;

    /// Case-insensitive lookup matching either `code` or `email`.
    fn find_partner_by_code_or_email(
        &self,
        identifier: &str,
    ) -> impl Future<Output = GateResult<Option<Partner>>> + Send;

    fn partner_code_or_email_taken(
        &self,
        candidates: &[String],
    ) -> impl Future<Output = GateResult<bool>> + Send;

    fn update_partner(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdatePartner,
    ) -> impl Future<Output = GateResult<Partner>> + Send;

    fn delete_partner(&self, id: Uuid) -> impl Future<Output = GateResult<()>> + Send;

    fn list_partners(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = GateResult<Page<Partner>>> + Send;
}

pub trait PartnerProfileRepository: Send + Sync {
    fn create_partner_profile(
        &self,
        input: CreatePartnerProfile,
    ) -> impl Future<Output = GateResult<PartnerProfile>> + Send;

    fn get_partner_profile(
        &self,
        id: Uuid,
    ) -> impl Future<Output = GateResult<Option<PartnerProfile>>> + Send;

    fn update_partner_profile(
        &self,
        id: Uuid,
        input: UpdatePartnerProfile,
    ) -> impl Future<Output = GateResult<PartnerProfile>> + Send;

    fn delete_partner_profile(&self, id: Uuid) -> impl Future<Output = GateResult<()>> + Send;
}

pub trait ConfigurationRepository: Send + Sync {
    fn create_configuration(
        &self,
        input: CreateConfiguration,
    ) -> impl Future<Output = GateResult<Configuration>> + Send;

    /// The highest-version enabled row for (type, name), or `None`.
    fn latest_configuration(
        &self,
        config_type: ConfigType,
        name: &str,
    ) -> impl Future<Output = GateResult<Option<Configuration>>> + Send;
}

/// The full identity store: one backing implementation provides every
/// entity repository. Workflow managers are generic over this.
pub trait IdentityStore:
    UserRepository
    + UserProfileRepository
    + UserGroupRepository
    + PartnerRepository
    + PartnerProfileRepository
    + ConfigurationRepository
{
}

impl<T> IdentityStore for T where
    T: UserRepository
        + UserProfileRepository
        + UserGroupRepository
        + PartnerRepository
        + PartnerProfileRepository
        + ConfigurationRepository
{
}
