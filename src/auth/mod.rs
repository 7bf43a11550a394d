use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, username: String, expiry_hours: u64) -> Result<Self, AuthError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::TokenGeneration(format!("expiry of {} hours is out of range", expiry_hours)))?
            .timestamp();

        Ok(Self {
            sub: user_id,
            username,
            exp,
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Missing Authorization header")]
    MissingToken,

    #[error("{0}")]
    MalformedHeader(&'static str),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// Issues and validates bearer tokens and hashes passwords at the configured
/// bcrypt cost. User lookup belongs to the user service.
#[derive(Clone)]
pub struct IdentityProvider {
    secret: String,
    expiry_hours: u64,
    password_cost: u32,
}

impl IdentityProvider {
    pub fn new(security: &SecurityConfig) -> Self {
        Self {
            secret: security.jwt_secret.clone(),
            expiry_hours: security.jwt_expiry_hours,
            password_cost: security.password_hash_cost,
        }
    }

    pub fn expiry_seconds(&self) -> Result<u64, AuthError> {
        self.expiry_hours
            .checked_mul(3600)
            .ok_or_else(|| AuthError::TokenGeneration(format!("expiry of {} hours is out of range", self.expiry_hours)))
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        hash_password(password, self.password_cost)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let claims = Claims::new(user.id, user.username.clone(), self.expiry_hours)?;
        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());

        encode(&Header::default(), &claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims)
    }
}

/// Extract the bearer token from an Authorization header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or(AuthError::MalformedHeader("Authorization header must use Bearer token format"))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MalformedHeader("Empty JWT token"));
    }
    Ok(token)
}

/// bcrypt hash in modular crypt format; the salt and cost travel inside it
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// A stored value that is not a bcrypt hash never verifies
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}
