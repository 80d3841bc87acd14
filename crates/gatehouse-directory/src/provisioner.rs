//! Directory provisioning client.
//!
//! Mirrors an account's credential into the external directory and
//! keeps an encrypted local copy (the `ldap_info` blob) for later
//! password changes. Every operation binds with the service account,
//! performs one verb, and releases the session unconditionally —
//! a failed unbind is logged, never propagated.

use gatehouse_auth::PayloadCipher;
use gatehouse_core::error::{GateError, GateResult};
use gatehouse_core::models::user::{LDAP_INFO_KEY, User};
use tokio::time::timeout;
use tracing::warn;

use crate::backend::{DirectoryBackend, DirectoryError, DirectorySession};
use crate::settings::{DirectoryCredentials, DirectorySettings};

pub struct DirectoryProvisioner<B: DirectoryBackend> {
    backend: B,
    cipher: PayloadCipher,
}

impl<B: DirectoryBackend> DirectoryProvisioner<B> {
    pub fn new(backend: B, cipher: PayloadCipher) -> Self {
        Self { backend, cipher }
    }

    /// Bind with the service account, failing fast with a typed
    /// timeout if the directory is unreachable.
    async fn bind_service(
        &self,
        settings: &DirectorySettings,
    ) -> Result<B::Session, DirectoryError> {
        let deadline = settings.connect_timeout();
        timeout(
            deadline,
            self.backend
                .bind(&settings.service_bind_dn(), &settings.password),
        )
        .await
        .map_err(|_| DirectoryError::Timeout(deadline))?
    }

    async fn release(session: B::Session) {
        if let Err(err) = session.unbind().await {
            warn!(error = %err, "failed to close directory session");
        }
    }

    /// Decrypt the stored credential tuple. Decode failure means the
    /// directory info is unavailable, not a crash.
    pub fn stored_credentials(&self, user: &User) -> Result<DirectoryCredentials, DirectoryError> {
        let blob = user
            .data_get(LDAP_INFO_KEY)
            .and_then(|v| v.as_str())
            .ok_or(DirectoryError::CredentialsUnavailable)?;
        let value = self
            .cipher
            .decode(blob, None)
            .map_err(|_| DirectoryError::CredentialsUnavailable)?;
        serde_json::from_value(value).map_err(|_| DirectoryError::CredentialsUnavailable)
    }

    fn encrypt_credentials(&self, credentials: &DirectoryCredentials) -> GateResult<String> {
        let value = serde_json::to_value(credentials)
            .map_err(|e| GateError::Internal(e.to_string()))?;
        Ok(self.cipher.encode(&value, None)?)
    }

    /// Create a directory entry `cn=<username>` under the configured
    /// base. Returns the encrypted credential blob the caller stores
    /// under the account's `ldap_info` key. An "already exists"
    /// provider failure surfaces as the conflict error.
    pub async fn create_directory_user(
        &self,
        settings: &DirectorySettings,
        username: &str,
        password: &str,
    ) -> GateResult<String> {
        let mut session = self.bind_service(settings).await?;
        let outcome = session
            .create_user(&settings.user_base(), username, password)
            .await;
        Self::release(session).await;
        outcome?;

        let credentials = DirectoryCredentials {
            dc: settings.dc.clone(),
            ou: settings.user_ou.clone(),
            cn: username.to_string(),
            password: password.to_string(),
        };
        self.encrypt_credentials(&credentials)
    }

    /// Change the directory password, authorizing with the previously
    /// stored password, then re-encrypt and store the new tuple.
    pub async fn update_directory_password(
        &self,
        settings: &DirectorySettings,
        user: &mut User,
        new_password: &str,
    ) -> GateResult<()> {
        let mut credentials = self.stored_credentials(user)?;

        let mut session = self.bind_service(settings).await?;
        let outcome = session
            .change_password(&credentials.dn(), &credentials.password, new_password)
            .await;
        Self::release(session).await;
        outcome?;

        credentials.password = new_password.to_string();
        let blob = self.encrypt_credentials(&credentials)?;
        user.data_set(LDAP_INFO_KEY, serde_json::Value::String(blob));
        Ok(())
    }

    /// Delete the account's directory entry and drop the local
    /// credential copy.
    pub async fn delete_directory_user(
        &self,
        settings: &DirectorySettings,
        user: &mut User,
    ) -> GateResult<()> {
        let credentials = self.stored_credentials(user)?;
        self.delete_directory_entry(settings, &credentials).await?;
        user.data_remove(LDAP_INFO_KEY);
        Ok(())
    }

    /// Delete a directory entry by credential tuple. This is the
    /// compensation target for partially-provisioned accounts.
    pub async fn delete_directory_entry(
        &self,
        settings: &DirectorySettings,
        credentials: &DirectoryCredentials,
    ) -> GateResult<()> {
        let mut session = self.bind_service(settings).await?;
        let outcome = session.delete_user(&credentials.dn()).await;
        Self::release(session).await;
        outcome?;
        Ok(())
    }

    /// Add the account's entry to the configured provisioning group.
    /// No-op when no group is configured.
    pub async fn add_user_to_group(
        &self,
        settings: &DirectorySettings,
        user: &User,
    ) -> GateResult<()> {
        let Some(group_dn) = settings.group_dn() else {
            return Ok(());
        };
        let credentials = self.stored_credentials(user)?;

        let mut session = self.bind_service(settings).await?;
        let outcome = session.add_to_group(&credentials.dn(), &group_dn).await;
        Self::release(session).await;
        outcome?;
        Ok(())
    }
}
