//! Signed bearer and subject tokens (HS256).
//!
//! Two token shapes share one signer: bearer tokens carry a user ID
//! and drive principal resolution; subject tokens carry an arbitrary
//! subject string (a user name) and back the activation and
//! password-reset mail flows. Lifetimes are always explicit.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Subject — user ID or user name, depending on the token shape.
    sub: String,
    /// Issued-at (Unix timestamp).
    iat: i64,
    /// Expiration (Unix timestamp).
    exp: i64,
}

/// HS256 token signer/verifier around a server-held symmetric key.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    fn issue(&self, subject: String, ttl_secs: u64) -> Result<String, AuthError> {
        if ttl_secs == 0 {
            return Err(AuthError::InvalidLifetime);
        }
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject,
            iat: now,
            exp: now + ttl_secs as i64,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }

    /// Issue a bearer token for a user ID.
    pub fn issue_user_token(&self, user_id: Uuid, ttl_secs: u64) -> Result<String, AuthError> {
        self.issue(user_id.to_string(), ttl_secs)
    }

    /// Verify a bearer token; returns the user ID on success.
    pub fn verify_user_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.verify(token)?;
        Uuid::parse_str(&claims.sub)
            .map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))
    }

    /// Issue a subject token (activation / password-reset mails).
    pub fn issue_subject_token(&self, subject: &str, ttl_secs: u64) -> Result<String, AuthError> {
        self.issue(subject.to_string(), ttl_secs)
    }

    /// Verify a subject token; returns the embedded subject string.
    pub fn verify_subject_token(&self, token: &str) -> Result<String, AuthError> {
        self.verify(token).map(|claims| claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret-key")
    }

    #[test]
    fn user_token_round_trip() {
        let signer = signer();
        let user_id = Uuid::new_v4();
        let token = signer.issue_user_token(user_id, 600).unwrap();
        assert_eq!(signer.verify_user_token(&token).unwrap(), user_id);
    }

    #[test]
    fn subject_token_round_trip() {
        let signer = signer();
        let token = signer.issue_subject_token("alice", 600).unwrap();
        assert_eq!(signer.verify_subject_token(&token).unwrap(), "alice");
    }

    #[test]
    fn zero_lifetime_is_rejected() {
        let signer = signer();
        assert!(matches!(
            signer.issue_subject_token("alice", 0),
            Err(AuthError::InvalidLifetime)
        ));
    }

    #[test]
    fn expired_token_fails_verification() {
        let signer = signer();
        let token = signer.issue_user_token(Uuid::new_v4(), 1).unwrap();
        std::thread::sleep(std::time::Duration::from_secs(2));
        assert!(matches!(
            signer.verify_user_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn tampered_token_fails_verification() {
        let signer = signer();
        let token = signer.issue_user_token(Uuid::new_v4(), 600).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(matches!(
            signer.verify_user_token(&tampered),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let token = signer().issue_user_token(Uuid::new_v4(), 600).unwrap();
        let other = TokenSigner::new("other-secret-key");
        assert!(other.verify_user_token(&token).is_err());
    }
}
