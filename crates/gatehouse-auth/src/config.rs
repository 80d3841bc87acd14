//! Authentication configuration.

use crate::password::PasswordPolicy;

/// Configuration for token issuance and password handling.
///
/// Constructed at startup and passed explicitly into the components
/// that need it — nothing here is read from process-wide state.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Symmetric HS256 signing key for bearer and subject tokens.
    pub token_secret: String,
    /// 256-bit AES-GCM key for opaque payload blobs (directory
    /// credential storage).
    pub payload_key: [u8; 32],
    /// Access token lifetime in seconds (default: 3600).
    /// Refresh tokens live twice as long.
    pub access_token_ttl_secs: u64,
    /// Activation-mail token lifetime in seconds (default: 86_400).
    pub activation_token_ttl_secs: u64,
    /// Reset-mail token lifetime in seconds. Always explicit; there
    /// is no non-expiring fallback (default: 3600).
    pub reset_token_ttl_secs: u64,
    /// Optional pepper prepended to passwords before hashing.
    pub pepper: Option<String>,
    pub password_policy: PasswordPolicy,
}

impl AuthConfig {
    pub fn refresh_token_ttl_secs(&self) -> u64 {
        self.access_token_ttl_secs * 2
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            payload_key: [0u8; 32],
            access_token_ttl_secs: 3600,
            activation_token_ttl_secs: 86_400,
            reset_token_ttl_secs: 3600,
            pepper: None,
            password_policy: PasswordPolicy::default(),
        }
    }
}
