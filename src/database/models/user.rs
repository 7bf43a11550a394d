use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Registered account. Not `Serialize`: responses go through `UserSummary`
/// so the password hash can never leak into a payload.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, username: impl Into<String>, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            password_hash,
            created_at: Utc::now(),
        }
    }
}
