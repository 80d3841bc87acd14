//! Shared harness for workflow tests: in-memory store, in-memory
//! directory, recording notifier, and stub project provisioner.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gatehouse_auth::{AuthConfig, PayloadCipher, password};
use gatehouse_core::dispatch::{ComputeInfo, Notifier, ProjectInfo, ProjectProvisioner};
use gatehouse_core::error::{GateError, GateResult};
use gatehouse_core::models::configuration::{ConfigType, CreateConfiguration};
use gatehouse_core::models::profile::CreateUserProfile;
use gatehouse_core::models::user::{AccountType, CreateUser, User, UserStatus, UserType};
use gatehouse_core::repository::{
    ConfigurationRepository, UserGroupRepository, UserProfileRepository, UserRepository,
};
use gatehouse_core::roles::Role;
use gatehouse_db::SurrealStore;
use gatehouse_directory::{DirectoryProvisioner, MemoryDirectory};
use gatehouse_managers::{ManagerConfig, UserManager};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

pub const PAYLOAD_KEY: [u8; 32] = [7u8; 32];
pub const TEST_PASSWORD: &str = "Passw0rd!";

#[derive(Debug, Clone)]
pub struct SentMail {
    pub kind: &'static str,
    pub email: String,
    pub token: String,
}

/// Records every dispatched mail; can be switched into failure mode.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn fail_dispatch(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn sent_of(&self, kind: &str) -> Vec<SentMail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.kind == kind)
            .cloned()
            .collect()
    }

    fn record(&self, kind: &'static str, email: &str, token: &str) -> GateResult<bool> {
        if self.fail.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.sent.lock().unwrap().push(SentMail {
            kind,
            email: email.to_string(),
            token: token.to_string(),
        });
        Ok(true)
    }
}

impl Notifier for RecordingNotifier {
    async fn activate_user(&self, email: &str, token: &str) -> GateResult<bool> {
        self.record("activate", email, token)
    }

    async fn reset_password(&self, email: &str, token: &str) -> GateResult<bool> {
        self.record("reset", email, token)
    }

    async fn send_compute_info(&self, email: &str, compute: &ComputeInfo) -> GateResult<bool> {
        self.record("compute", email, &compute.project_name)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ProjectMode {
    Succeed,
    Refuse,
    Hang,
}

#[derive(Clone)]
pub struct StubProjects {
    pub mode: ProjectMode,
}

impl ProjectProvisioner for StubProjects {
    async fn create_project(&self, project_name: &str, user_name: &str) -> GateResult<ProjectInfo> {
        match self.mode {
            ProjectMode::Succeed => Ok(ProjectInfo {
                project_name: project_name.to_string(),
                domain_name: Some("default".into()),
                project_dn: None,
                user_dn: Some(format!("cn={user_name}")),
            }),
            ProjectMode::Refuse => Err(GateError::Rpc("project quota exceeded".into())),
            ProjectMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                unreachable!("the caller applies a shorter deadline")
            }
        }
    }
}

pub type Store = SurrealStore<Db>;
pub type Manager = UserManager<Store, MemoryDirectory, RecordingNotifier>;

pub struct Harness {
    pub db: Surreal<Db>,
    pub store: Store,
    pub manager: Manager,
    pub backend: MemoryDirectory,
    pub notifier: RecordingNotifier,
    pub group_id: Uuid,
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        token_secret: "workflow-test-secret".into(),
        payload_key: PAYLOAD_KEY,
        access_token_ttl_secs: 3600,
        activation_token_ttl_secs: 86_400,
        reset_token_ttl_secs: 3600,
        pepper: None,
        password_policy: Default::default(),
    }
}

/// Spin up the full stack against in-memory backends. The directory
/// configuration record is always present; `directory_enabled`
/// toggles its `enabled` flag.
pub async fn harness(directory_enabled: bool) -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gatehouse_db::run_migrations(&db).await.unwrap();

    let store = SurrealStore::new(db.clone());

    let group = store
        .create_group(gatehouse_core::models::group::CreateUserGroup {
            name: "default".into(),
            group_type: None,
            description: None,
            permissions: None,
            status: true,
        })
        .await
        .unwrap();

    store
        .create_configuration(CreateConfiguration {
            config_type: ConfigType::Backend,
            name: "ldap_config".into(),
            version: 1,
            status: true,
            contents: serde_json::json!({
                "enabled": directory_enabled,
                "url": "ldap://127.0.0.1:389",
                "dc": "dc=example,dc=com",
                "cn": "admin",
                "password": "svc-secret",
                "group_cn": "cloud",
            }),
        })
        .await
        .unwrap();

    let backend = MemoryDirectory::new();
    let notifier = RecordingNotifier::default();
    let manager = UserManager::new(
        store.clone(),
        DirectoryProvisioner::new(backend.clone(), PayloadCipher::new(PAYLOAD_KEY)),
        notifier.clone(),
        auth_config(),
        ManagerConfig {
            default_group_id: group.id,
            ..Default::default()
        },
    );

    Harness {
        db,
        store,
        manager,
        backend,
        notifier,
        group_id: group.id,
    }
}

/// Insert a user directly at the store level, bypassing workflows.
pub async fn seed_user(harness: &Harness, name: &str, role: Role, status: UserStatus) -> User {
    let profile = harness
        .store
        .create_profile(CreateUserProfile {
            full_name: format!("{name} full"),
            ..Default::default()
        })
        .await
        .unwrap();

    harness
        .store
        .create_user(CreateUser {
            user_name: name.into(),
            email: format!("{name}@example.com"),
            password: password::hash_password(TEST_PASSWORD, None).unwrap(),
            status,
            user_type: UserType::Personal,
            account_type: AccountType::Eu,
            role,
            level: 0,
            group_id: harness.group_id,
            profile_id: profile.id,
            is_active: status == UserStatus::Active,
            data: None,
        })
        .await
        .unwrap()
}

/// Bearer token for an existing user.
pub fn bearer(harness: &Harness, user: &User) -> String {
    harness
        .manager
        .tokens()
        .issue_user_token(user.id, 600)
        .unwrap()
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row count for any table; used to assert compensation cleanups.
pub async fn count_rows(harness: &Harness, table: &str) -> u64 {
    let mut result = harness
        .db
        .query(format!("SELECT count() AS total FROM {table} GROUP ALL"))
        .await
        .unwrap();
    let rows: Vec<CountRow> = result.take(0).unwrap();
    rows.first().map(|r| r.total).unwrap_or(0)
}
