//! Partner workflow tests: registration with fatal activation mail,
//! activation, self-service password change, delete modes.

mod common;

use common::{TEST_PASSWORD, bearer, count_rows, harness, seed_user};
use gatehouse_core::error::GateError;
use gatehouse_core::models::partner::{CreatePartnerProfile, UpdatePartnerProfile};
use gatehouse_core::models::user::UserStatus;
use gatehouse_core::repository::PartnerRepository;
use gatehouse_core::roles::Role;
use gatehouse_managers::partners::{
    CreatePartnerInput, DeletePartnerInput, PartnerManager, UpdatePartnerInput,
};
use gatehouse_managers::ManagerConfig;

fn partner_manager(h: &common::Harness) -> PartnerManager<common::Store, common::RecordingNotifier> {
    PartnerManager::new(
        h.store.clone(),
        h.notifier.clone(),
        common::auth_config(),
        ManagerConfig {
            default_group_id: h.group_id,
            ..Default::default()
        },
    )
}

fn register_input(email: &str) -> CreatePartnerInput {
    CreatePartnerInput {
        email: email.into(),
        password: TEST_PASSWORD.into(),
        objective: Some("resell compute".into()),
        profile: CreatePartnerProfile {
            full_name: Some("Pat Partner".into()),
            org_name: Some("Acme".into()),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn partner_registration_and_activation() {
    let h = harness(false).await;
    let manager = partner_manager(&h);

    let mut ctx = h.manager.build_context("create_partner", None, None, false).await;
    let partner = manager
        .create_partner(&mut ctx, register_input("PAT@ACME.COM"))
        .await
        .unwrap();

    assert_eq!(partner.email, "pat@acme.com");
    assert_eq!(partner.code.len(), 8);
    assert_eq!(partner.status, UserStatus::Deactivated);
    assert!(!partner.approved);
    assert!(!partner.is_active);
    assert_eq!(ctx.status(), Some(201));

    // Activation mail carries a token for the partner code.
    let mails = h.notifier.sent_of("activate");
    assert_eq!(mails.len(), 1);
    let mut ctx = h.manager.build_context("activate_partner", None, None, false).await;
    let activated = manager.activate_partner(&mut ctx, &mails[0].token).await.unwrap();
    assert_eq!(activated.status, UserStatus::Active);
    assert!(activated.is_active);
    // Activation does not imply approval.
    assert!(!activated.approved);

    // Replay: already activated.
    let mut ctx = h.manager.build_context("activate_partner", None, None, false).await;
    assert!(manager.activate_partner(&mut ctx, &mails[0].token).await.is_none());
    assert!(matches!(ctx.error(), Some(GateError::AlreadyActivated)));
}

#[tokio::test]
async fn failed_activation_mail_aborts_partner_registration() {
    let h = harness(false).await;
    let manager = partner_manager(&h);
    h.notifier.fail_dispatch();

    let profiles_before = count_rows(&h, "partner_profile").await;

    let mut ctx = h.manager.build_context("create_partner", None, None, false).await;
    assert!(
        manager
            .create_partner(&mut ctx, register_input("mail@acme.com"))
            .await
            .is_none()
    );
    assert!(matches!(ctx.error(), Some(GateError::NotificationFailed { .. })));
    assert_eq!(ctx.status(), Some(500));

    // The profile row was compensated away; no partner row exists.
    assert_eq!(count_rows(&h, "partner_profile").await, profiles_before);
    assert_eq!(count_rows(&h, "partner").await, 0);
}

#[tokio::test]
async fn duplicate_partner_email_conflicts() {
    let h = harness(false).await;
    let manager = partner_manager(&h);

    let mut ctx = h.manager.build_context("create_partner", None, None, false).await;
    manager
        .create_partner(&mut ctx, register_input("dup@acme.com"))
        .await
        .unwrap();

    let mut ctx = h.manager.build_context("create_partner", None, None, false).await;
    assert!(
        manager
            .create_partner(&mut ctx, register_input("DUP@acme.com"))
            .await
            .is_none()
    );
    assert!(matches!(ctx.error(), Some(GateError::AlreadyExists { .. })));
}

#[tokio::test]
async fn partner_password_change_requires_old_password() {
    let h = harness(false).await;
    let manager = partner_manager(&h);

    let mut ctx = h.manager.build_context("create_partner", None, None, false).await;
    let partner = manager
        .create_partner(&mut ctx, register_input("pw@acme.com"))
        .await
        .unwrap();

    // Wrong old password: rejected.
    let mut ctx = h.manager.build_context("update_partner", None, None, false).await;
    let input = UpdatePartnerInput {
        password: Some("NewPassw0rd!".into()),
        old_password: Some("wrong".into()),
        ..Default::default()
    };
    assert!(manager.update_partner(&mut ctx, &partner.code, input).await.is_none());
    assert!(matches!(ctx.error(), Some(GateError::PasswordInvalid)));

    // Correct old password: accepted, and profile fields merge.
    let mut ctx = h.manager.build_context("update_partner", None, None, false).await;
    let input = UpdatePartnerInput {
        password: Some("NewPassw0rd!".into()),
        old_password: Some(TEST_PASSWORD.into()),
        objective: Some("  expand region  ".into()),
        profile: UpdatePartnerProfile {
            org_city: Some("Hanoi".into()),
            // Blank after trim: leave unchanged.
            org_name: Some("   ".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let updated = manager
        .update_partner(&mut ctx, &partner.code, input)
        .await
        .unwrap();
    assert_eq!(updated.objective.as_deref(), Some("expand region"));
    assert_ne!(updated.password, partner.password);
}

#[tokio::test]
async fn admin_approves_and_deletes_partners() {
    let h = harness(false).await;
    let manager = partner_manager(&h);
    let admin = seed_user(&h, "padmin", Role::Admin, UserStatus::Active).await;

    let mut ctx = h.manager.build_context("create_partner", None, None, false).await;
    let partner = manager
        .create_partner(&mut ctx, register_input("appr@acme.com"))
        .await
        .unwrap();

    // Admin approval via status change.
    let token = bearer(&h, &admin);
    let mut ctx = h
        .manager
        .build_context("update_partner", Some(&token), None, true)
        .await;
    let input = UpdatePartnerInput {
        status: Some(UserStatus::Active),
        approved: Some(true),
        ..Default::default()
    };
    let updated = manager
        .update_partner(&mut ctx, &partner.code, input)
        .await
        .unwrap();
    assert!(updated.approved);
    assert_eq!(updated.status, UserStatus::Active);

    // Soft delete.
    let mut ctx = h
        .manager
        .build_context("delete_partner", Some(&token), None, true)
        .await;
    manager
        .delete_partner(&mut ctx, &partner.code, DeletePartnerInput { remove_from_db: false })
        .await
        .unwrap();
    let softened = h.store.get_partner(partner.id).await.unwrap().unwrap();
    assert!(softened.deleted);
    assert_eq!(softened.status, UserStatus::Deactivated);

    // Hard delete.
    let mut ctx = h
        .manager
        .build_context("delete_partner", Some(&token), None, true)
        .await;
    manager
        .delete_partner(&mut ctx, &partner.code, DeletePartnerInput { remove_from_db: true })
        .await
        .unwrap();
    assert!(h.store.get_partner(partner.id).await.unwrap().is_none());

    // Non-admin cannot delete.
    let mut ctx = h.manager.build_context("delete_partner", None, None, false).await;
    assert!(
        manager
            .delete_partner(&mut ctx, "whatever", DeletePartnerInput::default())
            .await
            .is_none()
    );
    assert_eq!(ctx.status(), Some(403));
}
