use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use tracing::error;

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// False for a wrong password; errors only on a malformed stored hash.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Validates a new password against its confirmation, then hashes it. The
/// confirmation value is consumed here and never persisted. This is the
/// ordered pre-persistence step every password mutation goes through.
pub fn prepare_password(password: &str, password_confirm: &str) -> Result<String, ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation("Password too short".into()));
    }
    if password != password_confirm {
        return Err(ApiError::Validation("Passwords are not the same".into()));
    }
    hash_password(password).map_err(ApiError::Internal)
}

/// One-time password reset token. Only `hashed` is ever persisted; `raw` is
/// handed to the user once and discarded.
#[derive(Debug)]
pub struct ResetToken {
    pub raw: String,
    pub hashed: String,
    pub expires_at: OffsetDateTime,
}

impl ResetToken {
    pub fn issue() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let raw = hex::encode(bytes);
        Self {
            hashed: hash_reset_token(&raw),
            expires_at: OffsetDateTime::now_utc() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
            raw,
        }
    }
}

/// SHA-256 hex digest, applied to the token both at issuance and when a
/// presented token is matched against the stored form.
pub fn hash_reset_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
