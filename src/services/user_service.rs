use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{required_text, ServiceError};
use crate::api::format::{TokenResponse, UserSummary};
use crate::auth::{verify_password, AuthError, IdentityProvider};
use crate::database::models::User;
use crate::database::StoreTx;

const MIN_PASSWORD_LEN: usize = 6;
/// bcrypt ignores input past this many bytes
const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub async fn register(
    tx: &mut dyn StoreTx,
    identity: &IdentityProvider,
    input: NewUser,
) -> Result<UserSummary, ServiceError> {
    let email = required_text("email", &input.email)?;
    if !valid_email(&email) {
        return Err(ServiceError::Validation("email is not a valid address".to_string()));
    }
    let username = required_text("username", &input.username)?;
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if input.password.len() > MAX_PASSWORD_BYTES {
        return Err(ServiceError::Validation(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }

    let hasher = identity.clone();
    let password = input.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash_password(&password))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))??;

    let user = User::new(email, username, password_hash);
    tx.insert_user(&user).await?;

    info!("Registered user {} ({})", user.username, user.id);
    Ok(UserSummary::from(user))
}

/// Verify credentials and issue a bearer token. Unknown usernames and wrong
/// passwords are indistinguishable to the caller.
pub async fn authenticate(
    tx: &mut dyn StoreTx,
    identity: &IdentityProvider,
    credentials: Credentials,
) -> Result<TokenResponse, ServiceError> {
    let user = tx.find_user_by_username(credentials.username.trim()).await?;

    let verified = match user {
        Some(user) => {
            let stored = user.password_hash.clone();
            let password = credentials.password.clone();
            let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
                .await
                .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
            matches.then_some(user)
        }
        None => None,
    };

    let user = match verified {
        Some(user) => user,
        None => {
            warn!("Failed login for username '{}'", credentials.username);
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let access_token = identity.issue_token(&user)?;
    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: identity.expiry_seconds()?,
        user: UserSummary::from(user),
    })
}

pub async fn me(tx: &mut dyn StoreTx, user_id: Uuid) -> Result<UserSummary, ServiceError> {
    tx.find_user(user_id)
        .await?
        .map(UserSummary::from)
        .ok_or(ServiceError::not_found("User"))
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
