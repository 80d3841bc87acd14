//! Directory protocol boundary.
//!
//! The traits here model the synchronous LDAP-like verbs this core
//! consumes: bind / create_user / change_password / delete_user /
//! add_to_group / unbind. Concrete transports live outside the core;
//! an in-memory implementation for tests is in [`crate::memory`].

use std::time::Duration;

use gatehouse_core::error::GateError;
use thiserror::Error;

/// Normalized directory failure taxonomy. Provider-specific errors
/// are folded into these variants by each backend.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory entry already exists")]
    AlreadyExists,

    #[error("directory unreachable after {0:?}")]
    Timeout(Duration),

    #[error("directory provider error: {0}")]
    Provider(String),

    #[error("stored directory credentials unavailable")]
    CredentialsUnavailable,
}

impl From<DirectoryError> for GateError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::AlreadyExists => GateError::AlreadyExists {
                entity: "user".into(),
            },
            DirectoryError::Timeout(_) => GateError::DirectoryTimeout,
            DirectoryError::Provider(msg) => GateError::Directory(msg),
            DirectoryError::CredentialsUnavailable => GateError::Directory(err.to_string()),
        }
    }
}

/// One bound directory session. Every session must be released via
/// [`DirectorySession::unbind`] regardless of operation outcome.
pub trait DirectorySession: Send {
    fn create_user(
        &mut self,
        base: &str,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), DirectoryError>> + Send;

    fn change_password(
        &mut self,
        dn: &str,
        old_password: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<(), DirectoryError>> + Send;

    fn delete_user(&mut self, dn: &str) -> impl Future<Output = Result<(), DirectoryError>> + Send;

    fn add_to_group(
        &mut self,
        user_dn: &str,
        group_dn: &str,
    ) -> impl Future<Output = Result<(), DirectoryError>> + Send;

    fn unbind(self) -> impl Future<Output = Result<(), DirectoryError>> + Send;
}

/// A directory server endpoint that can authenticate sessions.
pub trait DirectoryBackend: Send + Sync {
    type Session: DirectorySession;

    fn bind(
        &self,
        dn: &str,
        password: &str,
    ) -> impl Future<Output = Result<Self::Session, DirectoryError>> + Send;
}
