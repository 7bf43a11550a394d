use serde::Deserialize;
use uuid::Uuid;

use super::AccessError;
use crate::database::StoreTx;

/// Anchor fields as supplied by a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AnchorInput {
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

/// Normalized anchor: the project is always known, and matches the task's
/// project when a task is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub project_id: Uuid,
    pub task_id: Option<Uuid>,
}

/// Validate and normalize a documentation anchor.
///
/// A task anchor derives its project from the task; a caller-supplied
/// `project_id` is discarded in that case. Authorization against the
/// resolved project is left to the caller.
pub async fn resolve_anchor(tx: &mut dyn StoreTx, input: AnchorInput) -> Result<Anchor, AccessError> {
    match input {
        AnchorInput { task_id: Some(task_id), .. } => {
            let task = tx.find_task(task_id).await?.ok_or(AccessError::NotFound("Task"))?;
            Ok(Anchor {
                project_id: task.project_id,
                task_id: Some(task.id),
            })
        }
        AnchorInput { project_id: Some(project_id), task_id: None } => {
            let project = tx
                .find_project(project_id)
                .await?
                .ok_or(AccessError::NotFound("Project"))?;
            Ok(Anchor {
                project_id: project.id,
                task_id: None,
            })
        }
        AnchorInput { project_id: None, task_id: None } => Err(AccessError::InvalidAttachment),
    }
}
