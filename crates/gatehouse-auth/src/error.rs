//! Authentication error types.

use gatehouse_core::error::GateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("token lifetime must be positive")]
    InvalidLifetime,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for GateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => GateError::TokenInvalid,
            AuthError::InvalidLifetime => GateError::Validation {
                message: err.to_string(),
            },
            AuthError::Crypto(msg) => GateError::Internal(msg),
        }
    }
}
