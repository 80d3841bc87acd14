//! Partner workflow manager — the partner-account mirror of the user
//! workflows, keyed by a generated partner code and carrying the
//! extra `approved` flag. Partners are not mirrored into the
//! directory backend.

use chrono::Utc;
use gatehouse_auth::{AuthConfig, TokenSigner, password};
use gatehouse_core::context::RequestContext;
use gatehouse_core::dispatch::Notifier;
use gatehouse_core::error::GateError;
use gatehouse_core::models::partner::{
    CreatePartner, CreatePartnerProfile, Partner, UpdatePartner, UpdatePartnerProfile,
};
use gatehouse_core::models::user::UserStatus;
use gatehouse_core::repository::{
    IdentityStore, Page, PageRequest, PartnerProfileRepository, PartnerRepository,
};
use gatehouse_core::saga::Saga;
use tracing::error;

use crate::config::ManagerConfig;
use crate::principal::{DELETE_ROLES, LIST_ROLES, UPDATE_ROLES, check_user};
use crate::validate::{clean, generate_partner_code, valid_email};

#[derive(Debug, Default)]
pub struct CreatePartnerInput {
    pub email: String,
    pub password: String,
    pub objective: Option<String>,
    pub profile: CreatePartnerProfile,
}

#[derive(Debug, Default)]
pub struct UpdatePartnerInput {
    pub password: Option<String>,
    pub old_password: Option<String>,
    pub status: Option<UserStatus>,
    pub objective: Option<String>,
    pub level: Option<i64>,
    pub approved: Option<bool>,
    pub profile: UpdatePartnerProfile,
}

#[derive(Debug, Default)]
pub struct DeletePartnerInput {
    pub remove_from_db: bool,
}

pub struct PartnerManager<S, N>
where
    S: IdentityStore + Clone + 'static,
    N: Notifier,
{
    store: S,
    notifier: N,
    tokens: TokenSigner,
    auth: AuthConfig,
    #[allow(dead_code)]
    config: ManagerConfig,
}

impl<S, N> PartnerManager<S, N>
where
    S: IdentityStore + Clone + 'static,
    N: Notifier,
{
    pub fn new(store: S, notifier: N, auth: AuthConfig, config: ManagerConfig) -> Self {
        let tokens = TokenSigner::new(&auth.token_secret);
        Self {
            store,
            notifier,
            tokens,
            auth,
            config,
        }
    }

    /// Register a new partner. The profile row is created first and
    /// deleted again if anything after it fails; unlike user
    /// registration, a failed activation-mail dispatch is fatal here.
    pub async fn create_partner(
        &self,
        ctx: &mut RequestContext,
        input: CreatePartnerInput,
    ) -> Option<Partner> {
        if ctx.failed() {
            return None;
        }
        let email = input.email.trim().to_lowercase();
        if !valid_email(&email) {
            ctx.set_error(GateError::EmailInvalid, 406);
            return None;
        }

        let code = generate_partner_code().to_lowercase();
        match self
            .store
            .partner_code_or_email_taken(&[code.clone(), email.clone()])
            .await
        {
            Ok(false) => {}
            Ok(true) => {
                ctx.set_error(GateError::AlreadyExists { entity: "partner".into() }, 406);
                return None;
            }
            Err(err) => {
                ctx.fail(err);
                return None;
            }
        }

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

        let profile = match self.store.create_partner_profile(input.profile).await {
            Ok(profile) => profile,
            Err(err) => {
                ctx.set_error(err, 500);
                return None;
            }
        };
        {
            let store = self.store.clone();
            let profile_id = profile.id;
            saga.on_failure("delete-partner-profile", async move {
                store.delete_partner_profile(profile_id).await
            });
        }

        // New partners await both activation and manual approval.
        let token = match self
            .tokens
            .issue_subject_token(&code, self.auth.activation_token_ttl_secs)
        {
            Ok(token) => token,
            Err(err) => {
                ctx.fail(err.into());
                saga.unwind().await;
                return None;
            }
        };
        match self.notifier.activate_user(&email, &token).await {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                ctx.set_error(
                    GateError::NotificationFailed { what: "activation".into() },
                    500,
                );
                saga.unwind().await;
                return None;
            }
        }

        let record = CreatePartner {
            code,
            email,
            password: password_hash,
            status: UserStatus::Deactivated,
            profile_id: profile.id,
            objective: clean(input.objective),
            level: 0,
            is_active: false,
            approved: false,
        };

        match self.store.create_partner(record).await {
            Ok(partner) => {
                saga.commit();
                ctx.set_status(201);
                Some(partner)
            }
            Err(err) => {
                saga.unwind().await;
                ctx.set_error(err, 500);
                None
            }
        }
    }

    /// Load a partner by code or e-mail, or by UUID.
    async fn resolve_partner(
        &self,
        ctx: &mut RequestContext,
        identifier: &str,
    ) -> Option<Partner> {
        let found = if let Ok(id) = uuid::Uuid::parse_str(identifier.trim()) {
            self.store.get_partner(id).await
        } else {
            self.store.find_partner_by_code_or_email(identifier).await
        };
        match found {
            Ok(Some(partner)) => Some(partner),
            Ok(None) => {
                ctx.set_error(GateError::NotFound { entity: "partner".into() }, 404);
                None
            }
            Err(err) => {
                ctx.fail(err);
                None
            }
        }
    }

    pub async fn get_partner(
        &self,
        ctx: &mut RequestContext,
        identifier: &str,
    ) -> Option<Partner> {
        self.resolve_partner(ctx, identifier).await
    }

    /// Admin-only keyset-paginated listing.
    pub async fn list_partners(
        &self,
        ctx: &mut RequestContext,
        page: PageRequest,
    ) -> Option<Page<Partner>> {
        if !check_user(ctx, Some(LIST_ROLES)) {
            return None;
        }
        match self.store.list_partners(page).await {
            Ok(page) => Some(page),
            Err(err) => {
                ctx.fail(err);
                None
            }
        }
    }

    /// Update a partner. Status changes and approval are admin-only;
    /// a self-service password change must present the old password.
    pub async fn update_partner(
        &self,
        ctx: &mut RequestContext,
        identifier: &str,
        input: UpdatePartnerInput,
    ) -> Option<Partner> {
        let partner = self.resolve_partner(ctx, identifier).await?;

        let mut update = UpdatePartner {
            objective: clean(input.objective),
            level: input.level,
            ..Default::default()
        };

        let is_admin = ctx.is_admin_request();
        if is_admin {
            if let Some(status) = input.status {
                update.status = Some(status);
                update.is_active = Some(status == UserStatus::Active);
            }
            update.approved = input.approved;
        }

        if let Some(new_password) = clean(input.password) {
            if !is_admin {
                let matches = input.old_password.as_deref().map(|old| {
                    password::verify_password(old, &partner.password, self.auth.pepper.as_deref())
                });
                match matches {
                    Some(Ok(true)) => {}
                    _ => {
                        ctx.set_error(GateError::PasswordInvalid, 406);
                        return None;
                    }
                }
            }
            if self.auth.password_policy.validate(&new_password).is_err() {
                ctx.set_error(
                    GateError::PasswordRequirementNotMet {
                        requirement: self.auth.password_policy.describe(),
                    },
                    406,
                );
                return None;
            }
            match password::hash_password(&new_password, self.auth.pepper.as_deref()) {
                Ok(hash) => update.password = Some(hash),
                Err(err) => {
                    ctx.fail(err.into());
                    return None;
                }
            }
        }

        let updated = match self
            .store
            .update_partner(partner.id, partner.version, update)
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                ctx.set_error(err, 500);
                return None;
            }
        };

        let profile_update = UpdatePartnerProfile {
            full_name: clean(input.profile.full_name),
            job_title: clean(input.profile.job_title),
            work_phone: clean(input.profile.work_phone),
            role: clean(input.profile.role),
            org_name: clean(input.profile.org_name),
            org_work_phone: clean(input.profile.org_work_phone),
            org_postal_code: clean(input.profile.org_postal_code),
            org_address: clean(input.profile.org_address),
            org_city: clean(input.profile.org_city),
            org_country_code: clean(input.profile.org_country_code),
            description: clean(input.profile.description),
        };
        if let Err(err) = self
            .store
            .update_partner_profile(partner.profile_id, profile_update)
            .await
        {
            ctx.set_error(err, 500);
            return None;
        }

        Some(updated)
    }

    /// Delete a partner: hard (row removed) or soft (deactivated and
    /// marked deleted). Admin-only.
    pub async fn delete_partner(
        &self,
        ctx: &mut RequestContext,
        identifier: &str,
        input: DeletePartnerInput,
    ) -> Option<()> {
        if !check_user(ctx, Some(DELETE_ROLES)) {
            return None;
        }
        let partner = self.resolve_partner(ctx, identifier).await?;

        if input.remove_from_db {
            if let Err(err) = self.store.delete_partner(partner.id).await {
                ctx.set_error(err, 500);
                return None;
            }
        } else {
            let update = UpdatePartner {
                status: Some(UserStatus::Deactivated),
                is_active: Some(false),
                deleted: Some(true),
                deleted_at: Some(Some(Utc::now())),
                ..Default::default()
            };
            if let Err(err) = self
                .store
                .update_partner(partner.id, partner.version, update)
                .await
            {
                ctx.set_error(err, 500);
                return None;
            }
        }
        Some(())
    }

    /// Activate a partner account from an activation-mail token
    /// (subject: partner code).
    pub async fn activate_partner(&self, ctx: &mut RequestContext, token: &str) -> Option<Partner> {
        let code = match self.tokens.verify_subject_token(token) {
            Ok(code) => code,
            Err(_) => {
                ctx.set_error(GateError::TokenInvalid, 401);
                return None;
            }
        };

        let partner = match self.store.find_partner_by_code_or_email(&code).await {
            Ok(Some(partner)) => partner,
            Ok(None) => {
                ctx.set_error(GateError::NotFound { entity: "partner".into() }, 404);
                return None;
            }
            Err(err) => {
                ctx.fail(err);
                return None;
            }
        };

        if partner.status == UserStatus::Active {
            ctx.set_error(GateError::AlreadyActivated, 406);
            return None;
        }
        if partner.status != UserStatus::Deactivated {
            ctx.set_error(GateError::BlockedOrDeleted, 403);
            return None;
        }

        let update = UpdatePartner {
            status: Some(UserStatus::Active),
            is_active: Some(true),
            ..Default::default()
        };
        match self
            .store
            .update_partner(partner.id, partner.version, update)
            .await
        {
            Ok(updated) => Some(updated),
            Err(err) => {
                ctx.set_error(err, 500);
                None
            }
        }
    }

    /// Re-send the activation mail for an unactivated partner.
    pub async fn resend_activation(
        &self,
        ctx: &mut RequestContext,
        identifier: &str,
    ) -> Option<()> {
        if !check_user(ctx, Some(UPDATE_ROLES)) {
            return None;
        }
        let partner = self.resolve_partner(ctx, identifier).await?;
        if partner.status != UserStatus::Deactivated {
            ctx.set_error(GateError::AlreadyActivated, 406);
            return None;
        }

        let token = match self
            .tokens
            .issue_subject_token(&partner.code, self.auth.activation_token_ttl_secs)
        {
            Ok(token) => token,
            Err(err) => {
                ctx.fail(err.into());
                return None;
            }
        };
        match self.notifier.activate_user(&partner.email, &token).await {
            Ok(true) => Some(()),
            Ok(false) | Err(_) => {
                error!(email = %partner.email, "partner activation mail dispatch failed");
                ctx.set_error(
                    GateError::NotificationFailed { what: "activation".into() },
                    500,
                );
                None
            }
        }
    }
}
