//! Password digests (Argon2, PHC strings) and HS256 session tokens.
//!
//! Tokens are self-contained: there is no revocation list, so expiry is the only way a
//! token stops being accepted.

use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use models::user::Role;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::access::AuthContext;
use crate::errors::ServiceError;

/// Signed claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// user id
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct CredentialService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl CredentialService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(cfg: &configs::AuthConfig) -> Self {
        Self::new(&cfg.jwt_secret, Duration::minutes(cfg.token_ttl_minutes))
    }

    /// Salted one-way digest; two calls with the same input yield different strings.
    pub fn hash(&self, plaintext: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ServiceError::Internal(format!("hashing failed: {e}")))
    }

    /// A digest that cannot be parsed never verifies.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => Argon2::default().verify_password(plaintext.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                debug!(error = %e, "stored digest is not a PHC string");
                false
            }
        }
    }

    /// Issue a token bound to the user's id and role.
    ///
    /// # Examples
    /// ```
    /// use service::credentials::CredentialService;
    /// use models::user::Role;
    /// let creds = CredentialService::new("secret", chrono::Duration::minutes(5));
    /// let token = creds.issue(1, "ash", Role::Standard).unwrap();
    /// let ctx = creds.validate(&token).unwrap();
    /// assert_eq!(ctx.user_id, 1);
    /// assert_eq!(ctx.username, "ash");
    /// ```
    pub fn issue(&self, user_id: i64, username: &str, role: Role) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("token encoding failed: {e}")))
    }

    /// Fails with `Unauthorized` on a bad signature, an expired token or garbage input.
    pub fn validate(&self, token: &str) -> Result<AuthContext, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {e}")))?;
        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| ServiceError::Unauthorized("invalid token subject".into()))?;
        Ok(AuthContext { user_id, username: data.claims.username, role: data.claims.role })
    }
}
