//! Integration tests for the partner and configuration repositories
//! using in-memory SurrealDB.

use gatehouse_core::error::GateError;
use gatehouse_core::models::configuration::{ConfigType, CreateConfiguration};
use gatehouse_core::models::partner::{CreatePartner, CreatePartnerProfile, UpdatePartner};
use gatehouse_core::models::user::UserStatus;
use gatehouse_core::repository::{
    ConfigurationRepository, PartnerProfileRepository, PartnerRepository,
};
use gatehouse_db::SurrealStore;
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> (SurrealStore<surrealdb::engine::local::Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gatehouse_db::run_migrations(&db).await.unwrap();

    let store = SurrealStore::new(db);
    let profile = store
        .create_partner_profile(CreatePartnerProfile {
            full_name: Some("Acme Rep".into()),
            org_name: Some("Acme".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    (store, profile.id)
}

fn new_partner(profile_id: Uuid, code: &str, email: &str) -> CreatePartner {
    CreatePartner {
        code: code.into(),
        email: email.into(),
        password: "$argon2id$stub-hash".into(),
        status: UserStatus::Deactivated,
        profile_id,
        objective: None,
        level: 0,
        is_active: false,
        approved: false,
    }
}

#[tokio::test]
async fn create_find_and_update_partner() {
    let (store, profile_id) = setup().await;

    let partner = store
        .create_partner(new_partner(profile_id, "ab12cd34", "rep@acme.com"))
        .await
        .unwrap();
    assert_eq!(partner.code, "ab12cd34");
    assert!(!partner.approved);
    assert_eq!(partner.version, 1);

    let by_code = store
        .find_partner_by_code_or_email("AB12CD34")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_code.id, partner.id);
    let by_email = store
        .find_partner_by_code_or_email("rep@acme.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, partner.id);

    assert!(
        store
            .partner_code_or_email_taken(&["rep@acme.com".to_string()])
            .await
            .unwrap()
    );

    let update = UpdatePartner {
        status: Some(UserStatus::Active),
        is_active: Some(true),
        approved: Some(true),
        ..Default::default()
    };
    let updated = store
        .update_partner(partner.id, partner.version, update)
        .await
        .unwrap();
    assert!(updated.approved);
    assert_eq!(updated.status, UserStatus::Active);
    assert_eq!(updated.version, 2);

    // Stale version loses.
    let err = store
        .update_partner(partner.id, partner.version, UpdatePartner::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::UpdateConflict { .. }));
}

#[tokio::test]
async fn configuration_lookup_takes_highest_enabled_version() {
    let (store, _) = setup().await;

    for (version, enabled, url) in [
        (1, true, "ldap://one"),
        (3, false, "ldap://three-disabled"),
        (2, true, "ldap://two"),
    ] {
        store
            .create_configuration(CreateConfiguration {
                config_type: ConfigType::Backend,
                name: "ldap_config".into(),
                version,
                status: enabled,
                contents: json!({"enabled": true, "url": url}),
            })
            .await
            .unwrap();
    }

    let latest = store
        .latest_configuration(ConfigType::Backend, "ldap_config")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.version, 2);
    assert_eq!(latest.contents["url"], "ldap://two");

    assert!(
        store
            .latest_configuration(ConfigType::Backend, "missing")
            .await
            .unwrap()
            .is_none()
    );

    // The (type, name, version) triple is unique.
    let err = store
        .create_configuration(CreateConfiguration {
            config_type: ConfigType::Backend,
            name: "ldap_config".into(),
            version: 2,
            status: true,
            contents: json!({}),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::CommitFailed { .. }));
}
