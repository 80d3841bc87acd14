//! Password hashing (Argon2id) and the configurable password policy.
//!
//! Hashing uses OWASP-recommended parameters (memory: 19 MiB,
//! iterations: 2, parallelism: 1) with a random per-hash salt. An
//! optional pepper (server-side secret) can be prepended before
//! hashing and must match on verification.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use thiserror::Error;

use crate::error::AuthError;

fn peppered<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a password with Argon2id.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, AuthError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// A password that does not meet the configured policy.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PolicyViolation(String);

/// Configurable password requirements: length bounds plus required
/// character classes.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_digit: bool,
    pub require_symbol: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
            require_lowercase: true,
            require_uppercase: true,
            require_digit: true,
            require_symbol: false,
        }
    }
}

impl PasswordPolicy {
    pub fn validate(&self, password: &str) -> Result<(), PolicyViolation> {
        let length = password.chars().count();
        if length < self.min_length || length > self.max_length {
            return Err(PolicyViolation(format!(
                "length must be between {} and {} characters",
                self.min_length, self.max_length
            )));
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(PolicyViolation("a lowercase letter is required".into()));
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PolicyViolation("an uppercase letter is required".into()));
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PolicyViolation("a digit is required".into()));
        }
        if self.require_symbol && !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
            return Err(PolicyViolation("a symbol is required".into()));
        }
        Ok(())
    }

    /// Human-readable requirement summary, used in error messages.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!(
            "{}-{} characters",
            self.min_length, self.max_length
        )];
        if self.require_lowercase {
            parts.push("a lowercase letter".into());
        }
        if self.require_uppercase {
            parts.push("an uppercase letter".into());
        }
        if self.require_digit {
            parts.push("a digit".into());
        }
        if self.require_symbol {
            parts.push("a symbol".into());
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("hunter2", None).unwrap();
        assert!(verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("hunter2", None).unwrap();
        assert!(!verify_password("wrong", &hash, None).unwrap());
    }

    #[test]
    fn pepper_is_applied() {
        let hash = hash_password("hunter2", Some("pepper!")).unwrap();
        assert!(verify_password("hunter2", &hash, Some("pepper!")).unwrap());
        assert!(!verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(verify_password("pw", "not-a-hash", None).is_err());
    }

    #[test]
    fn policy_accepts_conforming_password() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("Passw0rd!").is_ok());
    }

    #[test]
    fn policy_rejects_violations() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("short1A").is_err());
        assert!(policy.validate("alllowercase1").is_err());
        assert!(policy.validate("ALLUPPERCASE1").is_err());
        assert!(policy.validate("NoDigitsHere").is_err());
    }

    #[test]
    fn symbol_requirement_is_configurable() {
        let policy = PasswordPolicy {
            require_symbol: true,
            ..Default::default()
        };
        assert!(policy.validate("Passw0rdx").is_err());
        assert!(policy.validate("Passw0rd!").is_ok());
    }

    #[test]
    fn describe_lists_requirements() {
        let desc = PasswordPolicy::default().describe();
        assert!(desc.contains("8-64"));
        assert!(desc.contains("digit"));
    }
}
