//! Per-workflow role gates and the shared authorization check.

use gatehouse_core::context::RequestContext;
use gatehouse_core::error::GateError;
use gatehouse_core::models::profile::UserProfile;
use gatehouse_core::models::user::{AccountType, User, UserStatus, UserType};
use gatehouse_core::roles::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::AdminSale, Role::AdminIt];
pub const GET_ROLES: &[Role] = &[Role::User, Role::Admin, Role::AdminSale, Role::AdminIt];
pub const LIST_ROLES: &[Role] = ADMIN_ROLES;
pub const CREATE_ROLES: &[Role] = &[Role::User, Role::Admin, Role::AdminSale, Role::AdminIt];
pub const UPDATE_ROLES: &[Role] = &[Role::User, Role::Admin, Role::AdminSale, Role::AdminIt];
pub const DELETE_ROLES: &[Role] = ADMIN_ROLES;

/// Validate the request against a role allow-list, then the
/// cross-principal rank gate or the self-request health checks.
/// On rejection the error is set on the context and `false` is
/// returned.
pub fn check_user(ctx: &mut RequestContext, roles: Option<&[Role]>) -> bool {
    if ctx.failed() {
        // Principal resolution already rejected the request.
        return false;
    }

    if let Some(roles) = roles {
        if ctx.request_user_has_role(roles) != Some(true) {
            ctx.set_error(GateError::ActionNotAllowed, 403);
            return false;
        }
    }

    if ctx.is_cross_request() {
        // Acting on someone else requires strictly higher rank; a
        // missing principal makes the comparison undefined and is
        // rejected as well.
        if ctx.requester_outranks_target() != Some(true) {
            ctx.set_error(GateError::ActionNotAllowed, 403);
            return false;
        }
        return true;
    }

    // Self request: validate target account health. `is_active` is
    // kept in sync with the status, so the status alone decides.
    let Some(target) = ctx.target_user.as_ref() else {
        ctx.set_error(GateError::NotFound { entity: "user".into() }, 404);
        return false;
    };
    match target.status {
        UserStatus::Active => true,
        UserStatus::Deactivated => {
            ctx.set_error(GateError::NotActivated, 403);
            false
        }
        UserStatus::Blocked | UserStatus::Deleted => {
            ctx.set_error(GateError::BlockedOrDeleted, 403);
            false
        }
    }
}

/// Identity attributes returned to sibling services and in login
/// responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub user_type: UserType,
    pub account_type: AccountType,
    pub status: UserStatus,
    pub data: serde_json::Value,
}

impl UserIdentity {
    pub fn from_parts(user: &User, profile: Option<&UserProfile>) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name.clone(),
            email: user.email.clone(),
            full_name: profile.map(|p| p.full_name.clone()),
            role: user.role,
            user_type: user.user_type,
            account_type: user.account_type,
            status: user.status,
            data: user.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role, status: UserStatus) -> User {
        let is_active = status == UserStatus::Active;
        User {
            id: Uuid::new_v4(),
            user_name: "u".into(),
            email: "u@example.com".into(),
            password: String::new(),
            status,
            user_type: UserType::Personal,
            account_type: AccountType::Eu,
            role,
            level: 0,
            group_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            is_active,
            data: serde_json::Value::Object(Default::default()),
            last_login: None,
            deleted: false,
            deleted_at: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ctx_with(request: User, target: User) -> RequestContext {
        let mut ctx = RequestContext::new("test", true);
        ctx.request_user = Some(request);
        ctx.target_user = Some(target);
        ctx.principals_resolved();
        ctx
    }

    #[test]
    fn role_gate_rejects_outsiders() {
        let mut ctx = ctx_with(
            user(Role::User, UserStatus::Active),
            user(Role::User, UserStatus::Active),
        );
        assert!(!check_user(&mut ctx, Some(DELETE_ROLES)));
        assert_eq!(ctx.status(), Some(403));
    }

    #[test]
    fn cross_request_needs_strictly_higher_rank() {
        // Equal rank: rejected.
        let mut ctx = ctx_with(
            user(Role::Admin, UserStatus::Active),
            user(Role::Admin, UserStatus::Active),
        );
        assert!(!check_user(&mut ctx, None));

        // Higher rank: allowed, even against a deactivated target.
        let mut ctx = ctx_with(
            user(Role::Admin, UserStatus::Active),
            user(Role::User, UserStatus::Deactivated),
        );
        assert!(check_user(&mut ctx, None));

        // Lower rank: rejected.
        let mut ctx = ctx_with(
            user(Role::AdminSale, UserStatus::Active),
            user(Role::AdminIt, UserStatus::Active),
        );
        assert!(!check_user(&mut ctx, None));
    }

    #[test]
    fn self_request_health_checks() {
        let healthy = user(Role::User, UserStatus::Active);
        let mut ctx = ctx_with(healthy.clone(), healthy);
        assert!(check_user(&mut ctx, Some(UPDATE_ROLES)));

        let deactivated = user(Role::User, UserStatus::Deactivated);
        let mut ctx = ctx_with(deactivated.clone(), deactivated);
        assert!(!check_user(&mut ctx, None));
        assert!(matches!(ctx.error(), Some(GateError::NotActivated)));

        let blocked = user(Role::User, UserStatus::Blocked);
        let mut ctx = ctx_with(blocked.clone(), blocked);
        assert!(!check_user(&mut ctx, None));
        assert!(matches!(ctx.error(), Some(GateError::BlockedOrDeleted)));

        let deleted = user(Role::User, UserStatus::Deleted);
        let mut ctx = ctx_with(deleted.clone(), deleted);
        assert!(!check_user(&mut ctx, None));
        assert!(matches!(ctx.error(), Some(GateError::BlockedOrDeleted)));
    }

    #[test]
    fn missing_target_is_not_found() {
        let mut ctx = RequestContext::new("test", true);
        assert!(!check_user(&mut ctx, None));
        assert_eq!(ctx.status(), Some(404));
    }
}
