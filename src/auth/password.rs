//! Password hashing and credential rules

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use regex::Regex;
use std::sync::OnceLock;

use super::{AuthError, AuthResult};

fn email_re() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Hash a password into a PHC string (Argon2id, random salt)
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Check a password against a stored PHC string. A malformed hash never verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Hash checked when the e-mail is unknown
fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| hash_password("pollify-decoy-password").ok())
        .as_deref()
}

/// Spend one Argon2 verification without an account. Always false.
pub fn verify_decoy(password: &str) -> bool {
    if let Some(phc) = decoy_hash() {
        let _ = verify_password(password, phc);
    }
    false
}

/// Reject malformed e-mails and short passwords before touching the store
pub fn validate_credentials(email: &str, password: &str, min_len: usize) -> AuthResult<()> {
    if !email_re().is_match(email.trim()) {
        return Err(AuthError::InvalidEmail);
    }
    if password.chars().count() < min_len {
        return Err(AuthError::PasswordTooShort(min_len));
    }
    Ok(())
}

/// Public name shown on a user's polls: the e-mail local part
pub fn display_name_for(email: &str) -> String {
    email
        .trim()
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}
