//! Response bodies. Entities that need nested user data are assembled here;
//! users are always rendered through `UserSummary`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Documentation, Project, Role, Task, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDetail {
    pub user: UserSummary,
    pub role: Role,
}

/// `GET /projects/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<UserSummary>,
    pub members: Vec<MemberDetail>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentationDetail {
    #[serde(flatten)]
    pub documentation: Documentation,
    pub author: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: UserSummary,
}

/// Body of successful deletes
#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub message: String,
}

impl Deleted {
    pub fn new(what: &str) -> Self {
        Self {
            message: format!("{} deleted successfully", what),
        }
    }
}
