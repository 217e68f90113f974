//! HS256 access-token generation and validation.
//!
//! Tokens carry the user's id and role; the HTTP layer decodes them into a
//! [`Principal`](tandem_core::Principal) on every request and nothing
//! downstream ever touches the raw token again.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tandem_core::{Principal, Role};
use uuid::Uuid;

use crate::error::AuthError;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's id.
    pub sub: String,
    /// The user's role name (e.g. `"admin"`, `"project_manager"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for revocation / audit.
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes.
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, access_token_expiry_mins: i64) -> Self {
        Self {
            secret: secret.into(),
            access_token_expiry_mins,
        }
    }
}

/// Generate an HS256 access token for the given user.
pub fn generate_access_token(
    user_id: &str,
    role: Role,
    config: &JwtConfig,
) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.access_token_expiry_mins * 60;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok(token)
}

/// Validate a token and resolve the embedded [`Principal`].
///
/// Signature and expiration are checked by the library; an unknown role
/// string is treated the same as a bad signature.
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Principal, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )
    .map_err(|_| AuthError::InvalidToken)?;

    let role: Role = token_data
        .claims
        .role
        .parse()
        .map_err(|_| AuthError::InvalidToken)?;

    Ok(Principal::new(token_data.claims.sub, role))
}
