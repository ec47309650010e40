use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session token payload: who, with which role, until when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: u64,
    pub role: u32,
    pub exp: u64,
}

pub fn create_token(
    secret: &str,
    ttl_hours: u64,
    id: u64,
    role: u32,
) -> anyhow::Result<(String, u64)> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let expires_at = ttl_hours
        .checked_mul(3600)
        .and_then(|ttl| ttl.checked_add(now))
        .ok_or_else(|| anyhow::anyhow!("token lifetime of {ttl_hours}h is out of range"))?;

    let claims = Claims {
        id,
        role,
        exp: expires_at,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, expires_at))
}

pub fn verify_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}
