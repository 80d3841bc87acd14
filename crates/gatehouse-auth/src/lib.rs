//! Gatehouse Auth — bearer/subject token codec (HS256), opaque
//! payload encryption (AES-256-GCM), and Argon2id password handling.

pub mod config;
pub mod error;
pub mod password;
pub mod payload;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use password::PasswordPolicy;
pub use payload::PayloadCipher;
pub use token::TokenSigner;
