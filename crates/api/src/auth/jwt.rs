//! Access tokens and refresh tokens.
//!
//! Access tokens are HS256 JWTs issued by `kdpdesk` and carrying [`Claims`].
//! Refresh tokens are opaque random strings. Only their SHA-256 digest is
//! written to `user_sessions`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use kdpdesk_core::types::DbId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// `iss` claim of every token this server signs.
pub const TOKEN_ISSUER: &str = "kdpdesk";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    /// `user`, `admin` or `superadmin` at issue time.
    pub role: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Signing secret and token lifetimes. Loaded by
/// [`ServerConfig::from_env`](crate::config::ServerConfig::from_env).
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_mins: i64,
    pub refresh_ttl_days: i64,
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_mins)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }
}

pub fn issue_access_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let issued_at = Utc::now();
    let claims = Claims {
        sub: user_id,
        role: role.to_owned(),
        iss: TOKEN_ISSUER.to_owned(),
        iat: issued_at.timestamp(),
        exp: (issued_at + config.access_ttl()).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Signature, expiry and issuer are all checked.
pub fn decode_access_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[TOKEN_ISSUER]);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// A freshly minted refresh token. `plaintext` goes to the client once.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub plaintext: String,
    pub hash: String,
}

impl RefreshToken {
    pub fn generate() -> Self {
        let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let hash = Self::digest(&plaintext);
        Self { plaintext, hash }
    }

    /// Lowercase hex SHA-256, the form stored in `refresh_token_hash`.
    pub fn digest(token: &str) -> String {
        Sha256::digest(token.as_bytes())
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}
