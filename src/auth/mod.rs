pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::Deserialize;
use validator::Validate;

use crate::config::Config;

pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Secrets and cost parameters shared by the login handler, the auth middleware
/// and every handler that hashes passwords. Registered as `web::Data<AuthSettings>`.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>, token_ttl_hours: i64, bcrypt_cost: u32) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_hours,
            bcrypt_cost,
        }
    }
}

impl From<&Config> for AuthSettings {
    fn from(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
            config.bcrypt_cost,
        )
    }
}

/// Payload of `POST /api/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// The user's email address.
    #[validate(email(message = "Username must be a valid email"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}
