use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{cascade, required_text, ServiceError};
use crate::access::{require, visibility, Action};
use crate::api::double_option;
use crate::database::models::{Task, TaskPriority, TaskStatus};
use crate::database::StoreTx;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskChanges {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// `null` unassigns
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

pub async fn create(tx: &mut dyn StoreTx, caller: Uuid, input: NewTask) -> Result<Task, ServiceError> {
    require(tx, caller, input.project_id, Action::CreateTask).await?;

    let mut task = Task::new(input.project_id, required_text("title", &input.title)?);
    task.description = input.description;
    task.status = input.status.unwrap_or_default();
    task.priority = input.priority.unwrap_or_default();
    task.assignee_id = check_assignee(tx, input.assignee_id).await?;

    tx.insert_task(&task).await?;
    info!("Created task {} in project {}", task.id, task.project_id);
    Ok(task)
}

pub async fn list(tx: &mut dyn StoreTx, caller: Uuid, project_id: Option<Uuid>) -> Result<Vec<Task>, ServiceError> {
    Ok(visibility::visible_tasks(tx, caller, project_id).await?)
}

pub async fn get(tx: &mut dyn StoreTx, caller: Uuid, task_id: Uuid) -> Result<Task, ServiceError> {
    let task = find(tx, task_id).await?;
    require(tx, caller, task.project_id, Action::ViewProject).await?;
    Ok(task)
}

pub async fn update(tx: &mut dyn StoreTx, caller: Uuid, task_id: Uuid, changes: TaskChanges) -> Result<Task, ServiceError> {
    let mut task = find(tx, task_id).await?;
    require(tx, caller, task.project_id, Action::UpdateTask).await?;

    if let Some(title) = changes.title {
        task.title = required_text("title", &title)?;
    }
    if let Some(description) = changes.description {
        task.description = description;
    }
    if let Some(status) = changes.status {
        task.status = status;
    }
    if let Some(priority) = changes.priority {
        task.priority = priority;
    }
    if let Some(assignee_id) = changes.assignee_id {
        task.assignee_id = check_assignee(tx, assignee_id).await?;
    }
    task.touch();

    tx.update_task(&task).await?;
    Ok(task)
}

pub async fn delete(tx: &mut dyn StoreTx, caller: Uuid, task_id: Uuid) -> Result<(), ServiceError> {
    let task = find(tx, task_id).await?;
    require(tx, caller, task.project_id, Action::DeleteTask).await?;

    let docs = cascade::delete_task(tx, task.id).await?;
    info!("Deleted task {} with {} documentation items", task.id, docs);
    Ok(())
}

async fn find(tx: &mut dyn StoreTx, task_id: Uuid) -> Result<Task, ServiceError> {
    tx.find_task(task_id).await?.ok_or(ServiceError::not_found("Task"))
}

async fn check_assignee(tx: &mut dyn StoreTx, assignee_id: Option<Uuid>) -> Result<Option<Uuid>, ServiceError> {
    match assignee_id {
        Some(id) => {
            tx.find_user(id).await?.ok_or(ServiceError::not_found("User"))?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}
