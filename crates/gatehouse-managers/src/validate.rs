//! Input shape validation and normalization helpers.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

/// Sentinel user name meaning "use the e-mail address instead".
pub const EMAIL_AS_USER_NAME: &str = "###";

static USER_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9@_.\-]*$").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// User names start with a letter and may contain lower-case
/// alphanumerics plus `@ _ . -`. Input is expected to be normalized
/// (lower-cased, trimmed) first.
pub fn valid_user_name(name: &str) -> bool {
    USER_NAME_RE.is_match(name)
}

/// RFC-shape e-mail check; full validation belongs to the mail layer.
pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trim an optional string; an empty result means "leave unchanged"
/// and collapses to `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

const CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a short partner code (8 chars, unambiguous charset).
pub fn generate_partner_code() -> String {
    let mut rng = rand::rng();
    (0..8)
        .map(|_| {
            let idx = rng.random_range(0..CODE_CHARSET.len());
            CODE_CHARSET[idx] as char
        })
        .collect()
}

/// Generate a random password for mirrored directory accounts
/// (base62, 24 chars).
pub fn generate_directory_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..24)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
