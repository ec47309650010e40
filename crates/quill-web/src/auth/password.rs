use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use quill_core::{PasswordCheck, PlainPassword};

pub fn verify_password(hash: &str, password: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Accepts argon2 PHC strings and, for seeded accounts, plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoredPassword;

impl PasswordCheck for StoredPassword {
    fn matches(&self, stored: &str, supplied: &str) -> bool {
        if stored.starts_with("$argon2") {
            return verify_password(stored, supplied).unwrap_or_else(|e| {
                tracing::error!("{e}");
                false
            });
        }
        PlainPassword.matches(stored, supplied)
    }
}
