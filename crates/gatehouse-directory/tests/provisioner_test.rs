//! Directory provisioning client tests against the in-memory
//! backend.

use chrono::Utc;
use gatehouse_auth::PayloadCipher;
use gatehouse_core::error::GateError;
use gatehouse_core::models::user::{
    AccountType, LDAP_INFO_KEY, User, UserStatus, UserType,
};
use gatehouse_core::roles::Role;
use gatehouse_directory::{
    DirectoryError, DirectoryProvisioner, DirectorySettings, MemoryDirectory,
};
use uuid::Uuid;

fn settings() -> DirectorySettings {
    DirectorySettings::from_contents(&serde_json::json!({
        "enabled": true,
        "url": "ldap://127.0.0.1:389",
        "dc": "dc=example,dc=com",
        "cn": "admin",
        "password": "svc-secret",
        "group_cn": "cloud",
    }))
    .unwrap()
}

fn provisioner(backend: MemoryDirectory) -> DirectoryProvisioner<MemoryDirectory> {
    DirectoryProvisioner::new(backend, PayloadCipher::new([3u8; 32]))
}

fn user(name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        user_name: name.into(),
        email: format!("{name}@example.com"),
        password: String::new(),
        status: UserStatus::Active,
        user_type: UserType::Personal,
        account_type: AccountType::Eu,
        role: Role::User,
        level: 0,
        group_id: Uuid::new_v4(),
        profile_id: Uuid::new_v4(),
        is_active: true,
        data: serde_json::Value::Object(Default::default()),
        last_login: None,
        deleted: false,
        deleted_at: None,
        version: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn create_stores_encrypted_credentials() {
    let backend = MemoryDirectory::new();
    let provisioner = provisioner(backend.clone());
    let settings = settings();

    let blob = provisioner
        .create_directory_user(&settings, "alice", "pw-alice")
        .await
        .unwrap();

    // Entry landed under the configured base.
    assert!(backend.contains("cn=alice,ou=Users,dc=example,dc=com"));
    assert_eq!(
        backend.password_of("cn=alice,ou=Users,dc=example,dc=com"),
        Some("pw-alice".to_string())
    );

    // The blob is opaque but decrypts back to the credential tuple.
    assert!(!blob.contains("pw-alice"));
    let mut u = user("alice");
    u.data_set(LDAP_INFO_KEY, serde_json::Value::String(blob));
    let creds = provisioner.stored_credentials(&u).unwrap();
    assert_eq!(creds.cn, "alice");
    assert_eq!(creds.password, "pw-alice");
    assert_eq!(creds.dn(), "cn=alice,ou=Users,dc=example,dc=com");

    // Session released exactly once.
    assert_eq!(backend.bind_count(), 1);
    assert_eq!(backend.unbind_count(), 1);
}

#[tokio::test]
async fn create_conflict_maps_to_already_exists_and_still_unbinds() {
    let backend = MemoryDirectory::new();
    backend.seed_entry("cn=alice,ou=Users,dc=example,dc=com", "other");
    let provisioner = provisioner(backend.clone());

    let err = provisioner
        .create_directory_user(&settings(), "alice", "pw")
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::AlreadyExists { .. }));

    // Unbind ran despite the failure.
    assert_eq!(backend.bind_count(), 1);
    assert_eq!(backend.unbind_count(), 1);
}

#[tokio::test]
async fn password_change_uses_old_password_and_reencrypts() {
    let backend = MemoryDirectory::new();
    let provisioner = provisioner(backend.clone());
    let settings = settings();

    let blob = provisioner
        .create_directory_user(&settings, "bob", "old-pw")
        .await
        .unwrap();
    let mut u = user("bob");
    u.data_set(LDAP_INFO_KEY, serde_json::Value::String(blob));

    provisioner
        .update_directory_password(&settings, &mut u, "new-pw")
        .await
        .unwrap();

    assert_eq!(
        backend.password_of("cn=bob,ou=Users,dc=example,dc=com"),
        Some("new-pw".to_string())
    );
    let creds = provisioner.stored_credentials(&u).unwrap();
    assert_eq!(creds.password, "new-pw");

    // A second change with a stale stored password would fail, so the
    // re-encryption above must have happened.
    provisioner
        .update_directory_password(&settings, &mut u, "third-pw")
        .await
        .unwrap();
    assert_eq!(
        backend.password_of("cn=bob,ou=Users,dc=example,dc=com"),
        Some("third-pw".to_string())
    );
}

#[tokio::test]
async fn delete_removes_entry_and_local_copy() {
    let backend = MemoryDirectory::new();
    let provisioner = provisioner(backend.clone());
    let settings = settings();

    let blob = provisioner
        .create_directory_user(&settings, "carol", "pw")
        .await
        .unwrap();
    let mut u = user("carol");
    u.data_set(LDAP_INFO_KEY, serde_json::Value::String(blob));

    provisioner
        .delete_directory_user(&settings, &mut u)
        .await
        .unwrap();

    assert!(!backend.contains("cn=carol,ou=Users,dc=example,dc=com"));
    assert!(u.data_get(LDAP_INFO_KEY).is_none());
}

#[tokio::test]
async fn group_membership_via_stored_credentials() {
    let backend = MemoryDirectory::new();
    let provisioner = provisioner(backend.clone());
    let settings = settings();

    let blob = provisioner
        .create_directory_user(&settings, "dave", "pw")
        .await
        .unwrap();
    let mut u = user("dave");
    u.data_set(LDAP_INFO_KEY, serde_json::Value::String(blob));

    provisioner.add_user_to_group(&settings, &u).await.unwrap();
    let members = backend.group_members("cn=cloud,ou=Groups,dc=example,dc=com");
    assert_eq!(members, vec!["cn=dave,ou=Users,dc=example,dc=com".to_string()]);
}

#[tokio::test]
async fn corrupt_blob_is_unavailable_not_a_crash() {
    let backend = MemoryDirectory::new();
    let provisioner = provisioner(backend);

    let mut u = user("erin");
    u.data_set(LDAP_INFO_KEY, serde_json::Value::String("garbage".into()));
    assert!(matches!(
        provisioner.stored_credentials(&u),
        Err(DirectoryError::CredentialsUnavailable)
    ));

    let plain = user("erin");
    assert!(matches!(
        provisioner.stored_credentials(&plain),
        Err(DirectoryError::CredentialsUnavailable)
    ));
}

#[tokio::test]
async fn refused_bind_surfaces_provider_error() {
    let backend = MemoryDirectory::new();
    backend.fail_binds();
    let provisioner = provisioner(backend.clone());

    let err = provisioner
        .create_directory_user(&settings(), "frank", "pw")
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::Directory(_)));
    assert_eq!(backend.unbind_count(), 0);
}
