//! Error types for the Gatehouse system.

use thiserror::Error;

/// Broad classification of a [`GateError`], used by the boundary layer
/// and by callers that branch on failure class rather than on the
/// precise variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad credentials or an invalid/expired token.
    AuthenticationFailed,
    /// Role or ownership violation.
    AuthorizationDenied,
    /// Entity absent.
    NotFound,
    /// Malformed input (name/e-mail/password shape).
    ValidationFailed,
    /// Uniqueness violation, local or directory-side, or a lost
    /// optimistic-concurrency race.
    ConflictExists,
    /// Store commit or integrity error.
    PersistenceFailed,
    /// Directory or downstream RPC error.
    ExternalServiceFailed,
    /// Mail dispatch error. Never fatal to the triggering workflow
    /// unless explicitly noted by the workflow.
    NotificationFailed,
    /// Required configuration record missing.
    ConfigMissing,
    /// Anything else.
    Internal,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("user not authorized")]
    NotAuthorized,

    #[error("user token invalid")]
    TokenInvalid,

    #[error("user password invalid")]
    PasswordInvalid,

    #[error("user action not allowed")]
    ActionNotAllowed,

    #[error("{entity} not found")]
    NotFound { entity: String },

    #[error("user not activated")]
    NotActivated,

    #[error("user already activated")]
    AlreadyActivated,

    #[error("user blocked or deleted")]
    BlockedOrDeleted,

    #[error("{entity} already exists")]
    AlreadyExists { entity: String },

    #[error("user name invalid")]
    NameInvalid,

    #[error("user e-mail invalid")]
    EmailInvalid,

    #[error("user password does not meet requirement: {requirement}")]
    PasswordRequirementNotMet { requirement: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("concurrent update conflict on {entity}")]
    UpdateConflict { entity: String },

    #[error("failed to commit object in database")]
    CommitFailed {
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("configuration not found: {name}")]
    ConfigNotFound { name: String },

    #[error("directory service error: {0}")]
    Directory(String),

    #[error("directory service timed out")]
    DirectoryTimeout,

    #[error("downstream call failed: {0}")]
    Rpc(String),

    #[error("downstream call timed out")]
    RpcTimeout,

    #[error("failed to send {what} e-mail")]
    NotificationFailed { what: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::NotAuthorized | GateError::TokenInvalid | GateError::PasswordInvalid => {
                ErrorKind::AuthenticationFailed
            }
            GateError::ActionNotAllowed => ErrorKind::AuthorizationDenied,
            GateError::NotFound { .. } => ErrorKind::NotFound,
            GateError::NotActivated
            | GateError::AlreadyActivated
            | GateError::BlockedOrDeleted => ErrorKind::AuthorizationDenied,
            GateError::NameInvalid
            | GateError::EmailInvalid
            | GateError::PasswordRequirementNotMet { .. }
            | GateError::Validation { .. } => ErrorKind::ValidationFailed,
            GateError::AlreadyExists { .. } | GateError::UpdateConflict { .. } => {
                ErrorKind::ConflictExists
            }
            GateError::CommitFailed { .. } => ErrorKind::PersistenceFailed,
            GateError::ConfigNotFound { .. } => ErrorKind::ConfigMissing,
            GateError::Directory(_)
            | GateError::DirectoryTimeout
            | GateError::Rpc(_)
            | GateError::RpcTimeout => ErrorKind::ExternalServiceFailed,
            GateError::NotificationFailed { .. } => ErrorKind::NotificationFailed,
            GateError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Default HTTP-style status code for this error. Workflows may
    /// override the status when attaching the error to a context.
    pub fn status(&self) -> u16 {
        match self {
            GateError::NotAuthorized | GateError::TokenInvalid | GateError::PasswordInvalid => 401,
            GateError::ActionNotAllowed
            | GateError::NotActivated
            | GateError::BlockedOrDeleted => 403,
            GateError::NotFound { .. } | GateError::ConfigNotFound { .. } => 404,
            GateError::AlreadyActivated
            | GateError::AlreadyExists { .. }
            | GateError::UpdateConflict { .. }
            | GateError::NameInvalid
            | GateError::EmailInvalid
            | GateError::PasswordRequirementNotMet { .. }
            | GateError::Validation { .. } => 406,
            _ => 500,
        }
    }

    /// The wrapped underlying error, when one exists. This is the
    /// explicit accessor for logging; it is never rendered to clients.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self)
    }
}

pub type GateResult<T> = Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_statuses_line_up() {
        assert_eq!(GateError::TokenInvalid.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(GateError::TokenInvalid.status(), 401);
        assert_eq!(GateError::ActionNotAllowed.status(), 403);
        assert_eq!(
            GateError::AlreadyExists { entity: "user".into() }.kind(),
            ErrorKind::ConflictExists
        );
        assert_eq!(
            GateError::UpdateConflict { entity: "user".into() }.kind(),
            ErrorKind::ConflictExists
        );
        assert_eq!(GateError::DirectoryTimeout.kind(), ErrorKind::ExternalServiceFailed);
    }

    #[test]
    fn commit_failed_exposes_cause() {
        let inner = std::io::Error::other("disk gone");
        let err = GateError::CommitFailed { source: Some(Box::new(inner)) };
        assert!(err.cause().is_some());
        assert!(GateError::CommitFailed { source: None }.cause().is_none());
    }
}
