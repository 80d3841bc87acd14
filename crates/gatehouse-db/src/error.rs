//! Database-specific error types and conversions.

use gatehouse_core::error::GateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("query failed: {0}")]
    Query(String),

    #[error("integrity violation: {0}")]
    Conflict(String),

    #[error("stale version for {entity} {id}")]
    VersionConflict { entity: &'static str, id: String },

    #[error("record not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Classify a statement-level failure: unique-index violations become
/// [`DbError::Conflict`], everything else stays a query error.
pub fn commit_error(err: surrealdb::Error) -> DbError {
    let msg = err.to_string();
    if msg.contains("already contains") || msg.contains("unique") {
        DbError::Conflict(msg)
    } else {
        DbError::Query(msg)
    }
}

impl From<DbError> for GateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => GateError::NotFound {
                entity: entity.to_string(),
            },
            DbError::VersionConflict { entity, .. } => GateError::UpdateConflict {
                entity: entity.to_string(),
            },
            DbError::Corrupt(msg) => GateError::Internal(msg),
            other => GateError::CommitFailed {
                source: Some(Box::new(other)),
            },
        }
    }
}
