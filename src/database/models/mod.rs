pub mod documentation;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;

pub use documentation::{DocType, Documentation};
pub use membership::{Membership, Role};
pub use project::Project;
pub use task::{Task, TaskPriority, TaskStatus};
pub use user::User;

use thiserror::Error;

/// A stored enum column held a value this build does not know.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
