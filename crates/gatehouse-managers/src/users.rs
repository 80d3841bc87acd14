//! User workflow manager: login, registration, update, delete,
//! activation, and password reset.
//!
//! Every workflow takes a [`RequestContext`] and either returns a
//! result or leaves a structured error on the context — expected
//! failures never cross this boundary as panics or raw errors.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gatehouse_auth::{AuthConfig, TokenSigner, password};
use gatehouse_core::context::RequestContext;
use gatehouse_core::dispatch::Notifier;
use gatehouse_core::error::GateError;
use gatehouse_core::models::profile::{CreateUserProfile, UpdateUserProfile};
use gatehouse_core::models::user::{
    AccountType, CreateUser, LDAP_INFO_KEY, UpdateUser, User, UserStatus, UserType,
};
use gatehouse_core::repository::{
    IdentityStore, Page, PageRequest, UserProfileRepository, UserRepository,
};
use gatehouse_core::saga::Saga;
use gatehouse_directory::settings::DirectoryCredentials;
use gatehouse_directory::{DirectoryBackend, DirectoryProvisioner, DirectorySettings};
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::ManagerConfig;
use crate::principal::{DELETE_ROLES, UPDATE_ROLES, GET_ROLES, LIST_ROLES, UserIdentity, check_user};
use crate::validate::{EMAIL_AS_USER_NAME, clean, valid_email, valid_user_name};

/// Access/refresh token pair. Refresh tokens live twice as long as
/// access tokens.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub token_type: &'static str,
    pub access_token: String,
    pub expires_in: u64,
    pub expires_on: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_in: u64,
    pub refresh_token_expires_on: DateTime<Utc>,
}

#[derive(Debug)]
pub struct LoginInput {
    pub password: String,
    /// Merge the full user attributes into the response.
    pub include_user: bool,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub tokens: TokenPair,
    pub identity: UserIdentity,
    pub attributes: Option<User>,
}

#[derive(Debug, Default)]
pub struct CreateUserInput {
    /// `###` means "use the e-mail address as the user name".
    pub user_name: String,
    pub email: String,
    pub password: String,
    /// Elevated fields; honored only for admin callers.
    pub role: Option<gatehouse_core::Role>,
    pub user_type: Option<UserType>,
    pub account_type: Option<AccountType>,
    pub status: Option<UserStatus>,
    pub profile: CreateUserProfile,
}

#[derive(Debug, Default)]
pub struct UpdateUserInput {
    pub password: Option<String>,
    pub old_password: Option<String>,
    /// Elevated fields; honored only for admin callers.
    pub role: Option<gatehouse_core::Role>,
    pub user_type: Option<UserType>,
    pub account_type: Option<AccountType>,
    pub status: Option<UserStatus>,
    pub level: Option<i64>,
    pub group_id: Option<Uuid>,
    pub profile: UpdateUserProfile,
}

#[derive(Debug, Default)]
pub struct DeleteUserInput {
    /// Hard-delete the row (and the directory entry) instead of
    /// soft-marking the account.
    pub remove_from_db: bool,
}

pub struct UserManager<S, B, N>
where
    S: IdentityStore + Clone + 'static,
    B: DirectoryBackend + 'static,
    N: Notifier,
{
    store: S,
    directory: Arc<DirectoryProvisioner<B>>,
    notifier: N,
    tokens: TokenSigner,
    auth: AuthConfig,
    config: ManagerConfig,
}

impl<S, B, N> UserManager<S, B, N>
where
    S: IdentityStore + Clone + 'static,
    B: DirectoryBackend + 'static,
    N: Notifier,
{
    pub fn new(
        store: S,
        directory: DirectoryProvisioner<B>,
        notifier: N,
        auth: AuthConfig,
        config: ManagerConfig,
    ) -> Self {
        let tokens = TokenSigner::new(&auth.token_secret);
        Self {
            store,
            directory: Arc::new(directory),
            notifier,
            tokens,
            auth,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tokens(&self) -> &TokenSigner {
        &self.tokens
    }

    // ------------------------------------------------------------------
    // Context construction / principal resolution
    // ------------------------------------------------------------------

    /// Build a request context and resolve its principals: decode the
    /// bearer token into the request user when authentication is
    /// required, resolve the target user from an explicit identifier
    /// (defaulting to the request user), and apply the
    /// cross-principal rank gate.
    pub async fn build_context(
        &self,
        task: &str,
        bearer: Option<&str>,
        target: Option<&str>,
        require_auth: bool,
    ) -> RequestContext {
        let mut ctx = RequestContext::new(task, require_auth);
        self.load_principals(&mut ctx, bearer, target).await;
        ctx
    }

    async fn load_principals(
        &self,
        ctx: &mut RequestContext,
        bearer: Option<&str>,
        target: Option<&str>,
    ) {
        if ctx.require_auth() {
            let Some(token) = bearer else {
                ctx.set_error(GateError::NotAuthorized, 401);
                return;
            };
            let user_id = match self.tokens.verify_user_token(token) {
                Ok(id) => id,
                Err(_) => {
                    ctx.set_error(GateError::NotAuthorized, 401);
                    return;
                }
            };
            match self.store.get_user(user_id).await {
                Ok(Some(user)) => ctx.request_user = Some(user),
                Ok(None) => {
                    ctx.set_error(GateError::NotAuthorized, 401);
                    return;
                }
                Err(err) => {
                    ctx.fail(err);
                    return;
                }
            }
        }

        // Target user: explicit identifier, else the request user.
        match target {
            Some(identifier) => match self.store.find_user(identifier).await {
                Ok(found) => ctx.target_user = found,
                Err(err) => {
                    ctx.fail(err);
                    return;
                }
            },
            None => ctx.target_user = ctx.request_user.clone(),
        }

        // Self-service operations run without a token; the target is
        // the acting principal then.
        if ctx.request_user.is_none() {
            ctx.request_user = ctx.target_user.clone();
        }
        ctx.principals_resolved();

        // A lower rank never acts on a higher or equal rank.
        if ctx.require_auth()
            && ctx.request_user.is_some()
            && ctx.target_user.is_some()
            && ctx.is_cross_request()
            && ctx.requester_outranks_target() != Some(true)
        {
            ctx.set_error(GateError::ActionNotAllowed, 403);
        }
    }

    // ------------------------------------------------------------------
    // Login / token issuance
    // ------------------------------------------------------------------

    fn issue_token_pair(&self, user: &User) -> Result<TokenPair, GateError> {
        let access_ttl = self.auth.access_token_ttl_secs;
        let refresh_ttl = self.auth.refresh_token_ttl_secs();
        let now = Utc::now();

        Ok(TokenPair {
            token_type: "Bearer",
            access_token: self.tokens.issue_user_token(user.id, access_ttl)?,
            expires_in: access_ttl,
            expires_on: now + Duration::seconds(access_ttl as i64),
            refresh_token: self.tokens.issue_user_token(user.id, refresh_ttl)?,
            refresh_token_expires_in: refresh_ttl,
            refresh_token_expires_on: now + Duration::seconds(refresh_ttl as i64),
        })
    }

    /// Authenticate the target user by password and issue a token
    /// pair.
    pub async fn login(&self, ctx: &mut RequestContext, input: LoginInput) -> Option<LoginOutput> {
        if !check_user(ctx, None) {
            return None;
        }
        let user = ctx.target_user.clone()?;

        match password::verify_password(&input.password, &user.password, self.auth.pepper.as_deref())
        {
            Ok(true) => {}
            Ok(false) => {
                ctx.set_error(GateError::PasswordInvalid, 401);
                return None;
            }
            Err(err) => {
                ctx.fail(err.into());
                return None;
            }
        }

        let tokens = match self.issue_token_pair(&user) {
            Ok(pair) => pair,
            Err(err) => {
                ctx.fail(err);
                return None;
            }
        };

        // Record the login; a failed stamp must not fail the login.
        let stamp = UpdateUser {
            last_login: Some(Utc::now()),
            ..Default::default()
        };
        if let Err(err) = self.store.update_user(user.id, user.version, stamp).await {
            warn!(user_id = %user.id, error = %err, "failed to record last login");
        }

        let profile = self.store.get_profile(user.profile_id).await.ok().flatten();
        let identity = UserIdentity::from_parts(&user, profile.as_ref());
        let attributes = input.include_user.then(|| user.clone());

        Some(LoginOutput {
            tokens,
            identity,
            attributes,
        })
    }

    /// Issue a fresh token pair for a healthy account.
    pub async fn refresh_token(&self, ctx: &mut RequestContext) -> Option<TokenPair> {
        if !check_user(ctx, None) {
            return None;
        }
        let user = ctx.target_user.clone()?;
        match self.issue_token_pair(&user) {
            Ok(pair) => Some(pair),
            Err(err) => {
                ctx.fail(err);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub async fn get_user(&self, ctx: &mut RequestContext, user_id: Option<&str>) -> Option<User> {
        if !check_user(ctx, Some(GET_ROLES)) {
            return None;
        }
        match user_id {
            Some(identifier) => match self.store.find_user(identifier).await {
                Ok(Some(user)) => Some(user),
                Ok(None) => {
                    ctx.set_error(GateError::NotFound { entity: "user".into() }, 404);
                    None
                }
                Err(err) => {
                    ctx.fail(err);
                    None
                }
            },
            None => ctx.target_user.clone(),
        }
    }

    /// Admin-only keyset-paginated listing.
    pub async fn list_users(
        &self,
        ctx: &mut RequestContext,
        page: PageRequest,
    ) -> Option<Page<User>> {
        if !check_user(ctx, Some(LIST_ROLES)) {
            return None;
        }
        match self.store.list_users(page).await {
            Ok(page) => Some(page),
            Err(err) => {
                ctx.fail(err);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Register a new user.
    ///
    /// The profile row is created first, then (when the directory
    /// backend is enabled) the directory entry, then the user row.
    /// Compensations run in reverse on the first failure, so a failed
    /// user commit deletes both the directory entry and the profile.
    pub async fn create_user(&self, ctx: &mut RequestContext, input: CreateUserInput) -> Option<User> {
        if ctx.failed() {
            return None;
        }
        let email = input.email.trim().to_lowercase();
        let mut user_name = input.user_name.trim().to_lowercase();

        if user_name == EMAIL_AS_USER_NAME {
            user_name = email.clone();
        } else if !valid_user_name(&user_name) {
            ctx.set_error(GateError::NameInvalid, 406);
            return None;
        }
        if !valid_email(&email) {
            ctx.set_error(GateError::EmailInvalid, 406);
            return None;
        }

        // One probe across both columns: a user name may not collide
        // with an existing e-mail and vice versa.
        match self
            .store
            .user_name_or_email_taken(&[user_name.clone(), email.clone()])
            .await
        {
            Ok(false) => {}
            Ok(true) => {
                ctx.set_error(GateError::AlreadyExists { entity: "user".into() }, 406);
                return None;
            }
            Err(err) => {
                ctx.fail(err);
                return None;
            }
        }

        // Defaults for self-registration; admins may elevate.
        let mut role = gatehouse_core::Role::User;
        let mut user_type = UserType::Personal;
        let mut account_type = AccountType::Eu;
        let mut status = UserStatus::Deactivated;

        if ctx.is_admin_request() {
            role = input.role.unwrap_or(role);
            let creator_role = ctx.request_user.as_ref().map(|u| u.role);
            // The creator must strictly outrank the requested role.
            if creator_role.is_none_or(|creator| creator <= role) {
                ctx.set_error(GateError::ActionNotAllowed, 400);
                return None;
            }
            user_type = input.user_type.unwrap_or(user_type);
            account_type = input.account_type.unwrap_or(account_type);
            status = input.status.unwrap_or(UserStatus::Active);
        }
        let is_active = status == UserStatus::Active;

        if self.auth.password_policy.validate(&input.password).is_err() {
            ctx.set_error(
                GateError::PasswordRequirementNotMet {
                    requirement: self.auth.password_policy.describe(),
                },
                406,
            );
            return None;
        }
        let password_hash =
            match password::hash_password(&input.password, self.auth.pepper.as_deref()) {
                Ok(hash) => hash,
                Err(err) => {
                    ctx.fail(err.into());
                    return None;
                }
            };

        let mut saga = Saga::new();

        // 1. Profile row, the rollback anchor for everything after.
        let profile = match self.store.create_profile(input.profile).await {
            Ok(profile) => profile,
            Err(err) => {
                ctx.set_error(err, 500);
                return None;
            }
        };
        {
            let store = self.store.clone();
            let profile_id = profile.id;
            saga.on_failure("delete-user-profile", async move {
                store.delete_profile(profile_id).await
            });
        }

        // 2. Directory entry, before the local user row is committed,
        //    so a downstream failure can still reach the compensating
        //    delete.
        let mut data = None;
        match DirectorySettings::load(&self.store).await {
            Ok(None) => {}
            Ok(Some(settings)) => {
                match self
                    .directory
                    .create_directory_user(&settings, &user_name, &input.password)
                    .await
                {
                    Ok(blob) => {
                        let mut map = serde_json::Map::new();
                        map.insert(LDAP_INFO_KEY.into(), serde_json::Value::String(blob));
                        data = Some(serde_json::Value::Object(map));

                        let directory = self.directory.clone();
                        let credentials = DirectoryCredentials {
                            dc: settings.dc.clone(),
                            ou: settings.user_ou.clone(),
                            cn: user_name.clone(),
                            password: input.password.clone(),
                        };
                        saga.on_failure("delete-directory-entry", async move {
                            directory
                                .delete_directory_entry(&settings, &credentials)
                                .await
                        });
                    }
                    Err(err) => {
                        ctx.fail(err);
                        saga.unwind().await;
                        return None;
                    }
                }
            }
            Err(err) => {
                ctx.fail(err);
                saga.unwind().await;
                return None;
            }
        }

        let record = CreateUser {
            user_name,
            email,
            password: password_hash,
            status,
            user_type,
            account_type,
            role,
            level: 0,
            group_id: self.config.default_group_id,
            profile_id: profile.id,
            is_active,
            data,
        };

        // Deactivated accounts get an activation mail; dispatch
        // failure is logged, never fatal to the registration.
        if record.status == UserStatus::Deactivated {
            match self
                .tokens
                .issue_subject_token(&record.user_name, self.auth.activation_token_ttl_secs)
            {
                Ok(token) => match self.notifier.activate_user(&record.email, &token).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(email = %record.email, "activation mail dispatch reported failure");
                    }
                    Err(err) => {
                        error!(email = %record.email, error = %err, "activation mail dispatch failed");
                    }
                },
                Err(err) => {
                    error!(email = %record.email, error = %err, "failed to sign activation token");
                }
            }
        }

        // 3. User row.
        match self.store.create_user(record).await {
            Ok(user) => {
                saga.commit();
                ctx.set_status(201);
                ctx.target_user = Some(user.clone());
                if ctx.request_user.is_none() {
                    ctx.request_user = Some(user.clone());
                }
                Some(user)
            }
            Err(err) => {
                saga.unwind().await;
                ctx.set_error(err, 500);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Check the presented password and hash the replacement.
    /// `require_old` is false only on the reset-token path.
    fn prepare_password(
        &self,
        ctx: &mut RequestContext,
        user: &User,
        new_password: &str,
        old_password: Option<&str>,
        require_old: bool,
    ) -> Option<String> {
        if require_old {
            let matches = old_password.map(|old| {
                password::verify_password(old, &user.password, self.auth.pepper.as_deref())
            });
            match matches {
                Some(Ok(true)) => {}
                _ => {
                    ctx.set_error(GateError::PasswordInvalid, 406);
                    return None;
                }
            }
        }

        if self.auth.password_policy.validate(new_password).is_err() {
            ctx.set_error(
                GateError::PasswordRequirementNotMet {
                    requirement: self.auth.password_policy.describe(),
                },
                406,
            );
            return None;
        }

        match password::hash_password(new_password, self.auth.pepper.as_deref()) {
            Ok(hash) => Some(hash),
            Err(err) => {
                ctx.fail(err.into());
                None
            }
        }
    }

    /// Mirror a local password change into the directory when the
    /// account has a provisioned entry. Runs before the local commit.
    async fn sync_directory_password(
        &self,
        ctx: &mut RequestContext,
        user: &mut User,
        new_password: &str,
    ) -> bool {
        let settings = match DirectorySettings::load(&self.store).await {
            Ok(Some(settings)) => settings,
            Ok(None) => return true,
            Err(err) => {
                ctx.fail(err);
                return false;
            }
        };
        if user.data_get(LDAP_INFO_KEY).is_none() {
            // Never provisioned; nothing to mirror.
            return true;
        }
        match self
            .directory
            .update_directory_password(&settings, user, new_password)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                ctx.fail(err);
                false
            }
        }
    }

    fn clean_profile_update(update: UpdateUserProfile) -> UpdateUserProfile {
        UpdateUserProfile {
            full_name: clean(update.full_name),
            short_name: clean(update.short_name),
            birthday: update.birthday,
            gender: update.gender,
            tax_no: clean(update.tax_no),
            id_no: clean(update.id_no),
            id_created_at: update.id_created_at,
            id_location: clean(update.id_location),
            id_expired_at: update.id_expired_at,
            phone_num: clean(update.phone_num),
            address: clean(update.address),
            city: clean(update.city),
            country_code: clean(update.country_code),
            ref_name: clean(update.ref_name),
            ref_phone: clean(update.ref_phone),
            ref_email: clean(update.ref_email),
            rep_name: clean(update.rep_name),
            rep_phone: clean(update.rep_phone),
            rep_email: clean(update.rep_email),
        }
    }

    /// Update the target user and their profile.
    pub async fn update_user(&self, ctx: &mut RequestContext, input: UpdateUserInput) -> Option<User> {
        self.apply_update(ctx, input, true).await
    }

    async fn apply_update(
        &self,
        ctx: &mut RequestContext,
        input: UpdateUserInput,
        require_old_password: bool,
    ) -> Option<User> {
        if !check_user(ctx, Some(UPDATE_ROLES)) {
            return None;
        }
        let mut user = ctx.target_user.clone()?;

        let profile_id = user.profile_id;
        match self.store.get_profile(profile_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                ctx.set_error(GateError::NotFound { entity: "user profile".into() }, 400);
                return None;
            }
            Err(err) => {
                ctx.fail(err);
                return None;
            }
        }

        let mut update = UpdateUser::default();

        if ctx.is_admin_request() {
            if let Some(new_role) = input.role {
                let requester = ctx.request_user.clone()?;
                // An admin may not raise anyone above their own rank,
                // and an equal rank may only be assigned to themself.
                if requester.role < new_role {
                    ctx.set_error(GateError::ActionNotAllowed, 400);
                    return None;
                }
                if requester.role == new_role && requester.id != user.id {
                    ctx.set_error(GateError::ActionNotAllowed, 400);
                    return None;
                }
                update.role = Some(new_role);
            }
            update.user_type = input.user_type;
            update.account_type = input.account_type;
            if let Some(status) = input.status {
                update.status = Some(status);
                update.is_active = Some(status == UserStatus::Active);
            }
            update.level = input.level;
            update.group_id = input.group_id;
        }

        if let Some(new_password) = clean(input.password) {
            let hash = self.prepare_password(
                ctx,
                &user,
                &new_password,
                input.old_password.as_deref(),
                require_old_password,
            )?;
            // Directory first: the local commit depends on it, and
            // the re-encrypted credential blob rides along.
            if !self.sync_directory_password(ctx, &mut user, &new_password).await {
                return None;
            }
            if user.data_get(LDAP_INFO_KEY).is_some() {
                update.data = Some(user.data.clone());
            }
            update.password = Some(hash);
        }

        // Persist the user, then the profile. A profile failure after
        // a committed user update is surfaced as-is; the user change
        // is not rolled back.
        let updated = match self.store.update_user(user.id, user.version, update).await {
            Ok(updated) => updated,
            Err(err) => {
                ctx.set_error(err, 500);
                return None;
            }
        };

        let profile_update = Self::clean_profile_update(input.profile);
        if let Err(err) = self.store.update_profile(profile_id, profile_update).await {
            ctx.set_error(err, 500);
            return None;
        }

        ctx.target_user = Some(updated.clone());
        Some(updated)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete the target user: hard (directory entry first, then the
    /// row) or soft (deactivate + mark deleted).
    pub async fn delete_user(&self, ctx: &mut RequestContext, input: DeleteUserInput) -> Option<()> {
        if !check_user(ctx, Some(DELETE_ROLES)) {
            return None;
        }
        let mut user = ctx.target_user.clone()?;

        if input.remove_from_db {
            // The directory entry goes first; if that fails the local
            // row must stay so the delete can be retried.
            match DirectorySettings::load(&self.store).await {
                Ok(None) => {}
                Ok(Some(settings)) => {
                    if user.data_get(LDAP_INFO_KEY).is_some() {
                        if let Err(err) = self
                            .directory
                            .delete_directory_user(&settings, &mut user)
                            .await
                        {
                            ctx.fail(err);
                            return None;
                        }
                    }
                }
                Err(err) => {
                    ctx.fail(err);
                    return None;
                }
            }
            if let Err(err) = self.store.delete_user(user.id).await {
                ctx.set_error(err, 500);
                return None;
            }
        } else {
            let update = UpdateUser {
                status: Some(UserStatus::Deactivated),
                is_active: Some(false),
                deleted: Some(true),
                deleted_at: Some(Some(Utc::now())),
                ..Default::default()
            };
            if let Err(err) = self.store.update_user(user.id, user.version, update).await {
                ctx.set_error(err, 500);
                return None;
            }
        }
        Some(())
    }

    // ------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------

    /// Activate an account from an activation-mail token.
    pub async fn activate_user(&self, ctx: &mut RequestContext, token: &str) -> Option<User> {
        let user_name = match self.tokens.verify_subject_token(token) {
            Ok(user_name) => user_name,
            Err(_) => {
                ctx.set_error(GateError::TokenInvalid, 401);
                return None;
            }
        };

        let user = match self.store.find_user_by_name_or_email(&user_name).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                ctx.set_error(GateError::NotFound { entity: "user".into() }, 404);
                return None;
            }
            Err(err) => {
                ctx.fail(err);
                return None;
            }
        };

        ctx.target_user = Some(user.clone());
        if ctx.request_user.is_none() {
            ctx.request_user = Some(user.clone());
        }
        ctx.principals_resolved();

        if user.status == UserStatus::Active {
            ctx.set_error(GateError::AlreadyActivated, 406);
            return None;
        }
        if user.status != UserStatus::Deactivated {
            ctx.set_error(GateError::BlockedOrDeleted, 403);
            return None;
        }

        let update = UpdateUser {
            status: Some(UserStatus::Active),
            is_active: Some(true),
            ..Default::default()
        };
        match self.store.update_user(user.id, user.version, update).await {
            Ok(updated) => {
                ctx.target_user = Some(updated.clone());
                Some(updated)
            }
            Err(err) => {
                ctx.set_error(err, 500);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Password reset
    // ------------------------------------------------------------------

    /// Send a reset-password mail. Unlike the activation mail, a
    /// dispatch failure here is fatal — the caller must know the mail
    /// did not go out.
    pub async fn request_password_reset(&self, ctx: &mut RequestContext) -> Option<()> {
        if !check_user(ctx, Some(UPDATE_ROLES)) {
            return None;
        }
        let user = ctx.target_user.clone()?;

        let token = match self
            .tokens
            .issue_subject_token(&user.user_name, self.auth.reset_token_ttl_secs)
        {
            Ok(token) => token,
            Err(err) => {
                ctx.fail(err.into());
                return None;
            }
        };

        match self.notifier.reset_password(&user.email, &token).await {
            Ok(true) => Some(()),
            Ok(false) => {
                ctx.set_error(
                    GateError::NotificationFailed { what: "reset password".into() },
                    500,
                );
                None
            }
            Err(err) => {
                error!(email = %user.email, error = %err, "reset mail dispatch failed");
                ctx.set_error(
                    GateError::NotificationFailed { what: "reset password".into() },
                    500,
                );
                None
            }
        }
    }

    /// Set a new password from a reset-mail token. Re-runs the
    /// authorization gate against the token's subject and then takes
    /// the normal update path without an old-password requirement.
    pub async fn reset_password(
        &self,
        ctx: &mut RequestContext,
        token: &str,
        new_password: &str,
    ) -> Option<User> {
        let user_name = match self.tokens.verify_subject_token(token) {
            Ok(user_name) => user_name,
            Err(_) => {
                ctx.set_error(GateError::TokenInvalid, 401);
                return None;
            }
        };

        let user = match self.store.find_user_by_name_or_email(&user_name).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                ctx.set_error(GateError::NotFound { entity: "user".into() }, 404);
                return None;
            }
            Err(err) => {
                ctx.fail(err);
                return None;
            }
        };

        ctx.target_user = Some(user.clone());
        if ctx.request_user.is_none() {
            ctx.request_user = Some(user);
        }
        ctx.principals_resolved();

        let input = UpdateUserInput {
            password: Some(new_password.to_string()),
            ..Default::default()
        };
        self.apply_update(ctx, input, false).await
    }
}
