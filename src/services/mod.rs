//! Resource operations. Each takes the request's transaction handle and the
//! authenticated caller; the handler owns `begin` and `commit`.

pub mod cascade;
pub mod documentation_service;
pub mod project_service;
pub mod task_service;
pub mod user_service;

use thiserror::Error;

use crate::access::AccessError;
use crate::auth::AuthError;
use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Database(other),
        }
    }
}

impl ServiceError {
    pub fn not_found(entity: &'static str) -> Self {
        ServiceError::Access(AccessError::NotFound(entity))
    }
}

/// Trimmed value of a required text field, or a validation error naming it.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
