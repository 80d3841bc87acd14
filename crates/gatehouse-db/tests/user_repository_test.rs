//! Integration tests for the user repository using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use gatehouse_core::error::GateError;
use gatehouse_core::models::group::CreateUserGroup;
use gatehouse_core::models::profile::CreateUserProfile;
use gatehouse_core::models::user::{
    AccountType, CreateUser, UpdateUser, UserStatus, UserType,
};
use gatehouse_core::repository::{
    PageRequest, UserGroupRepository, UserProfileRepository, UserRepository,
};
use gatehouse_core::roles::Role;
use gatehouse_db::SurrealStore;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up an in-memory DB, run migrations, create the
/// default group and a profile to hang users off.
async fn setup() -> (SurrealStore<surrealdb::engine::local::Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gatehouse_db::run_migrations(&db).await.unwrap();

    let store = SurrealStore::new(db);

    let group = store
        .create_group(CreateUserGroup {
            name: "default".into(),
            group_type: None,
            description: None,
            permissions: None,
            status: true,
        })
        .await
        .unwrap();

    let profile = store
        .create_profile(CreateUserProfile {
            full_name: "Alice Example".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    (store, group.id, profile.id)
}

fn new_user(group_id: Uuid, profile_id: Uuid, name: &str, email: &str) -> CreateUser {
    CreateUser {
        user_name: name.into(),
        email: email.into(),
        password: "$argon2id$stub-hash".into(),
        status: UserStatus::Deactivated,
        user_type: UserType::Personal,
        account_type: AccountType::Eu,
        role: Role::User,
        level: 0,
        group_id,
        profile_id,
        is_active: false,
        data: None,
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let (store, group_id, profile_id) = setup().await;

    let user = store
        .create_user(new_user(group_id, profile_id, "alice", "alice@example.com"))
        .await
        .unwrap();

    assert_eq!(user.user_name, "alice");
    assert_eq!(user.status, UserStatus::Deactivated);
    assert!(!user.is_active);
    assert_eq!(user.version, 1);
    assert_eq!(user.group_id, group_id);

    let fetched = store.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.email, "alice@example.com");

    assert!(store.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn find_user_by_identifier() {
    let (store, group_id, profile_id) = setup().await;
    let user = store
        .create_user(new_user(group_id, profile_id, "bob", "bob@example.com"))
        .await
        .unwrap();

    // By UUID string.
    let by_id = store.find_user(&user.id.to_string()).await.unwrap().unwrap();
    assert_eq!(by_id.id, user.id);

    // By name and by e-mail, case-insensitively.
    let by_name = store.find_user("  BOB  ").await.unwrap().unwrap();
    assert_eq!(by_name.id, user.id);
    let by_email = store.find_user("Bob@Example.Com").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    assert!(store.find_user("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn uniqueness_probe_spans_both_columns() {
    let (store, group_id, profile_id) = setup().await;
    store
        .create_user(new_user(group_id, profile_id, "carol", "carol@example.com"))
        .await
        .unwrap();

    // Name against name, e-mail against e-mail, and cross-column.
    for candidate in ["carol", "carol@example.com"] {
        assert!(
            store
                .user_name_or_email_taken(&[candidate.to_string()])
                .await
                .unwrap()
        );
    }
    assert!(
        !store
            .user_name_or_email_taken(&["dave".to_string(), "dave@example.com".to_string()])
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn duplicate_create_is_a_commit_failure() {
    let (store, group_id, profile_id) = setup().await;
    store
        .create_user(new_user(group_id, profile_id, "erin", "erin@example.com"))
        .await
        .unwrap();

    let err = store
        .create_user(new_user(group_id, profile_id, "erin", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::CommitFailed { .. }));
}

#[tokio::test]
async fn versioned_update_detects_stale_writes() {
    let (store, group_id, profile_id) = setup().await;
    let user = store
        .create_user(new_user(group_id, profile_id, "frank", "frank@example.com"))
        .await
        .unwrap();

    let update = UpdateUser {
        status: Some(UserStatus::Active),
        is_active: Some(true),
        ..Default::default()
    };
    let updated = store.update_user(user.id, user.version, update).await.unwrap();
    assert_eq!(updated.status, UserStatus::Active);
    assert!(updated.is_active);
    assert_eq!(updated.version, user.version + 1);

    // Replaying with the old version is a conflict, not an overwrite.
    let stale = UpdateUser {
        status: Some(UserStatus::Blocked),
        ..Default::default()
    };
    let err = store.update_user(user.id, user.version, stale).await.unwrap_err();
    assert!(matches!(err, GateError::UpdateConflict { .. }));

    // The row kept the first update.
    let current = store.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(current.status, UserStatus::Active);

    // A missing row is NotFound, not a conflict.
    let err = store
        .update_user(Uuid::new_v4(), 1, UpdateUser::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::NotFound { .. }));
}

#[tokio::test]
async fn keyset_pagination_walks_all_rows() {
    let (store, group_id, profile_id) = setup().await;
    for i in 0..7 {
        store
            .create_user(new_user(
                group_id,
                profile_id,
                &format!("user{i}"),
                &format!("user{i}@example.com"),
            ))
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut marker = None;
    loop {
        let page = store
            .list_users(PageRequest { limit: 3, marker })
            .await
            .unwrap();
        assert!(page.items.len() <= 3);
        seen.extend(page.items.iter().map(|u| u.id));
        match page.next_marker {
            Some(next) => {
                // The marker is the last row of the returned page.
                assert_eq!(page.items.last().unwrap().id, next);
                marker = Some(next);
            }
            None => break,
        }
    }

    assert_eq!(seen.len(), 7);
    let mut deduped = seen.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), 7, "pagination must not repeat rows");
}

#[tokio::test]
async fn purge_removes_only_aged_soft_deleted_rows() {
    let (store, group_id, profile_id) = setup().await;

    let old = store
        .create_user(new_user(group_id, profile_id, "old", "old@example.com"))
        .await
        .unwrap();
    let fresh = store
        .create_user(new_user(group_id, profile_id, "fresh", "fresh@example.com"))
        .await
        .unwrap();
    let live = store
        .create_user(new_user(group_id, profile_id, "live", "live@example.com"))
        .await
        .unwrap();

    let soft_delete = |at| UpdateUser {
        status: Some(UserStatus::Deactivated),
        is_active: Some(false),
        deleted: Some(true),
        deleted_at: Some(Some(at)),
        ..Default::default()
    };
    store
        .update_user(old.id, old.version, soft_delete(Utc::now() - Duration::days(60)))
        .await
        .unwrap();
    store
        .update_user(fresh.id, fresh.version, soft_delete(Utc::now()))
        .await
        .unwrap();

    let purged = store
        .purge_deleted_users(Utc::now() - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(purged, 1);

    assert!(store.get_user(old.id).await.unwrap().is_none());
    assert!(store.get_user(fresh.id).await.unwrap().is_some());
    assert!(store.get_user(live.id).await.unwrap().is_some());
}

#[tokio::test]
async fn hard_delete_removes_row() {
    let (store, group_id, profile_id) = setup().await;
    let user = store
        .create_user(new_user(group_id, profile_id, "gone", "gone@example.com"))
        .await
        .unwrap();

    store.delete_user(user.id).await.unwrap();
    assert!(store.get_user(user.id).await.unwrap().is_none());
}
