//! Opaque payload encryption (AES-256-GCM).
//!
//! Encodes a JSON-like structure into an opaque string —
//! `base64(nonce || ciphertext || tag)` — and back. Used for the
//! encrypted directory credential copy stored on each user row.
//! Decode failure on tamper or corruption is a typed error that
//! callers treat as "directory info unavailable", never a crash.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::AuthError;

#[derive(Clone)]
pub struct PayloadCipher {
    key: [u8; 32],
}

impl PayloadCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Encrypt a JSON value under the configured key, or under
    /// `key_override` when provided.
    pub fn encode(
        &self,
        value: &serde_json::Value,
        key_override: Option<&[u8; 32]>,
    ) -> Result<String, AuthError> {
        let key = key_override.unwrap_or(&self.key);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = serde_json::to_vec(value)
            .map_err(|e| AuthError::Crypto(format!("payload serialize: {e}")))?;
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|e| AuthError::Crypto(format!("AES-GCM encrypt: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    /// Invert [`PayloadCipher::encode`]. Fails with a typed error on
    /// tamper, truncation, or a wrong key.
    pub fn decode(
        &self,
        encoded: &str,
        key_override: Option<&[u8; 32]>,
    ) -> Result<serde_json::Value, AuthError> {
        let key = key_override.unwrap_or(&self.key);
        let combined = STANDARD
            .decode(encoded)
            .map_err(|e| AuthError::Crypto(format!("base64 decode: {e}")))?;

        if combined.len() < 13 {
            return Err(AuthError::Crypto("ciphertext too short".into()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| AuthError::Crypto(format!("AES-GCM decrypt: {e}")))?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| AuthError::Crypto(format!("payload deserialize: {e}")))
    }
}
