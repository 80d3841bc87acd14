//! RPC-facing provisioning manager.
//!
//! Serves sibling services over the RPC boundary: token
//! verification, identity lookup, directory-credential retrieval,
//! and the cloud-account provisioning saga (directory entry → group
//! membership → downstream project → local persistence, with a
//! compensating directory delete on any later failure).

use std::sync::Arc;
use std::time::Duration;

use gatehouse_auth::TokenSigner;
use gatehouse_core::dispatch::{ComputeInfo, Notifier, ProjectProvisioner};
use gatehouse_core::error::{GateError, GateResult};
use gatehouse_core::models::user::{LDAP_INFO_KEY, OS_INFO_KEY, UpdateUser, User};
use gatehouse_core::repository::{IdentityStore, UserProfileRepository, UserRepository};
use gatehouse_core::saga::Saga;
use gatehouse_directory::settings::DirectoryCredentials;
use gatehouse_directory::{DirectoryBackend, DirectoryProvisioner, DirectorySettings};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::config::ManagerConfig;
use crate::principal::UserIdentity;
use crate::validate::generate_directory_password;

/// Decrypted directory credentials merged with the stored cloud
/// project details, as served to sibling services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub dc: String,
    pub ou: String,
    pub cn: String,
    pub password: String,
    pub domain_name: Option<String>,
    pub project_name: Option<String>,
    pub project_dn: Option<String>,
    pub user_dn: Option<String>,
}

pub struct ProvisioningManager<S, B, P, N>
where
    S: IdentityStore + Clone + 'static,
    B: DirectoryBackend + 'static,
    P: ProjectProvisioner,
    N: Notifier,
{
    store: S,
    directory: Arc<DirectoryProvisioner<B>>,
    projects: P,
    notifier: N,
    tokens: TokenSigner,
    config: ManagerConfig,
}

impl<S, B, P, N> ProvisioningManager<S, B, P, N>
where
    S: IdentityStore + Clone + 'static,
    B: DirectoryBackend + 'static,
    P: ProjectProvisioner,
    N: Notifier,
{
    pub fn new(
        store: S,
        directory: Arc<DirectoryProvisioner<B>>,
        projects: P,
        notifier: N,
        tokens: TokenSigner,
        config: ManagerConfig,
    ) -> Self {
        Self {
            store,
            directory,
            projects,
            notifier,
            tokens,
            config,
        }
    }

    async fn identity_of(&self, user: &User) -> UserIdentity {
        let profile = self.store.get_profile(user.profile_id).await.ok().flatten();
        UserIdentity::from_parts(user, profile.as_ref())
    }

    /// Decode a bearer token and return the holder's identity.
    pub async fn verify_token(&self, token: &str) -> GateResult<UserIdentity> {
        let user_id = self
            .tokens
            .verify_user_token(token)
            .map_err(|_| GateError::NotAuthorized)?;
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(GateError::NotAuthorized)?;
        Ok(self.identity_of(&user).await)
    }

    /// Look up a user's identity by id, name, or e-mail.
    pub async fn get_user_identity(&self, identifier: &str) -> GateResult<UserIdentity> {
        let user = self
            .store
            .find_user(identifier)
            .await?
            .ok_or_else(|| GateError::NotFound { entity: "user".into() })?;
        Ok(self.identity_of(&user).await)
    }

    /// Decrypt the stored directory credentials and merge the cloud
    /// project details. A corrupt or absent blob is a typed failure,
    /// never a crash.
    pub async fn get_directory_info(&self, identifier: &str) -> GateResult<DirectoryInfo> {
        let user = self
            .store
            .find_user(identifier)
            .await?
            .ok_or_else(|| GateError::NotFound { entity: "user".into() })?;

        let credentials = self.directory.stored_credentials(&user)?;
        let os_info = user.data_get(OS_INFO_KEY).cloned().unwrap_or(json!({}));
        let string_of = |key: &str| {
            os_info
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Ok(DirectoryInfo {
            dc: credentials.dc,
            ou: credentials.ou,
            cn: credentials.cn,
            password: credentials.password,
            domain_name: string_of("domain_name"),
            project_name: string_of("project_name"),
            project_dn: string_of("project_dn"),
            user_dn: string_of("user_dn"),
        })
    }

    /// Provision a cloud account for an existing user: directory
    /// entry (keyed by e-mail), group membership, downstream project,
    /// then the encrypted credential copy and project details on the
    /// user row. The directory entry is deleted again if any later
    /// step fails.
    pub async fn provision_cloud_account(&self, user_id: Uuid) -> GateResult<User> {
        let mut user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| GateError::NotFound { entity: "user".into() })?;

        let settings = DirectorySettings::load(&self.store)
            .await?
            .ok_or_else(|| GateError::Directory("directory backend is disabled".into()))?;

        let mut saga = Saga::new();

        // 1. Directory entry. Cloud accounts are keyed by e-mail.
        let account_name = user.email.clone();
        let account_password = generate_directory_password();
        let blob = self
            .directory
            .create_directory_user(&settings, &account_name, &account_password)
            .await?;
        user.data_set(LDAP_INFO_KEY, serde_json::Value::String(blob));

        let credentials = DirectoryCredentials {
            dc: settings.dc.clone(),
            ou: settings.user_ou.clone(),
            cn: account_name.clone(),
            password: account_password,
        };
        {
            let directory = self.directory.clone();
            let settings = settings.clone();
            let credentials = credentials.clone();
            saga.on_failure("delete-directory-entry", async move {
                directory.delete_directory_entry(&settings, &credentials).await
            });
        }

        // 2. Group membership.
        if let Err(err) = self.directory.add_user_to_group(&settings, &user).await {
            saga.unwind().await;
            return Err(err);
        }

        // 3. Downstream project, under the fixed call deadline.
        let deadline = Duration::from_secs(self.config.project_rpc_timeout_secs);
        let project = match tokio::time::timeout(
            deadline,
            self.projects.create_project(&account_name, &account_name),
        )
        .await
        {
            Err(_) => {
                saga.unwind().await;
                return Err(GateError::RpcTimeout);
            }
            Ok(Err(err)) => {
                saga.unwind().await;
                return Err(err);
            }
            Ok(Ok(project)) => project,
        };

        user.data_set(
            OS_INFO_KEY,
            json!({
                "project_name": project.project_name,
                "domain_name": project.domain_name,
                "project_dn": project.project_dn,
                "user_dn": project.user_dn,
            }),
        );

        // 4. Persist the credential copy and project details.
        let update = UpdateUser {
            data: Some(user.data.clone()),
            ..Default::default()
        };
        let updated = match self.store.update_user(user.id, user.version, update).await {
            Ok(updated) => updated,
            Err(err) => {
                saga.unwind().await;
                return Err(err);
            }
        };
        saga.commit();

        // Confirmation mail is fire-and-forget.
        let compute = ComputeInfo {
            user_name: account_name,
            project_name: project.project_name,
        };
        match self.notifier.send_compute_info(&updated.email, &compute).await {
            Ok(true) => {}
            Ok(false) => warn!(email = %updated.email, "compute-info mail dispatch reported failure"),
            Err(err) => warn!(email = %updated.email, error = %err, "compute-info mail dispatch failed"),
        }

        Ok(updated)
    }
}
