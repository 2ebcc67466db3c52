use crate::auth::AuthSettings;
use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's email address.
    pub sub: String,
    /// The user's id at the time the token was issued.
    pub uid: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Generates a signed HS256 token for the given user.
///
/// The token expires after `settings.token_ttl_hours`.
///
/// # Returns
/// The encoded JWT, or `AppError::InternalServerError` if encoding fails.
pub fn generate_token(settings: &AuthSettings, user_id: i64, email: &str) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::hours(settings.token_ttl_hours))
        .ok_or_else(|| AppError::InternalServerError("Token expiration overflow".into()))?;

    let claims = Claims {
        sub: email.to_string(),
        uid: user_id,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a JWT string and decodes its claims.
///
/// Signature and expiration are checked with the default validation rules.
///
/// # Returns
/// The decoded `Claims`, or `AppError::Unauthorized` if the token is malformed,
/// its signature is invalid, or it has expired.
pub fn verify_token(settings: &AuthSettings, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}
