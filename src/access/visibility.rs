//! What a user may list: projects they own or belong to, and the tasks and
//! documentation inside those projects.

use uuid::Uuid;

use super::{require, AccessError, Action};
use crate::database::models::{Documentation, Project, Task};
use crate::database::StoreTx;
use crate::filter::{DocumentationFilter, DocumentationQuery, TaskQuery};

pub async fn visible_projects(tx: &mut dyn StoreTx, user_id: Uuid) -> Result<Vec<Project>, AccessError> {
    Ok(tx.projects_visible_to(user_id).await?)
}

async fn visible_project_ids(tx: &mut dyn StoreTx, user_id: Uuid) -> Result<Vec<Uuid>, AccessError> {
    let projects = visible_projects(tx, user_id).await?;
    Ok(projects.into_iter().map(|p| p.id).collect())
}

/// Tasks of one project (after an access check) or of every visible project.
pub async fn visible_tasks(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    project_id: Option<Uuid>,
) -> Result<Vec<Task>, AccessError> {
    let query = match project_id {
        Some(project_id) => {
            require(tx, user_id, project_id, Action::ViewProject).await?;
            TaskQuery::in_project(project_id)
        }
        None => TaskQuery::in_projects(visible_project_ids(tx, user_id).await?),
    };
    Ok(tx.list_tasks(&query).await?)
}

/// Translate a client filter into a store query, gating each id the client
/// named. Without an id the result is limited to visible projects.
pub async fn documentation_query(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    filter: &DocumentationFilter,
) -> Result<DocumentationQuery, AccessError> {
    if let Some(project_id) = filter.project_id {
        require(tx, user_id, project_id, Action::ViewProject).await?;
    }
    if let Some(task_id) = filter.task_id {
        let task = tx.find_task(task_id).await?.ok_or(AccessError::NotFound("Task"))?;
        require(tx, user_id, task.project_id, Action::ViewProject).await?;
    }

    let project_ids = if filter.project_id.is_none() && filter.task_id.is_none() {
        Some(visible_project_ids(tx, user_id).await?)
    } else {
        None
    };

    Ok(DocumentationQuery {
        project_ids,
        project_id: filter.project_id,
        task_id: filter.task_id,
        search: filter.search_term(),
        doc_type: filter.doc_type,
    })
}

pub async fn visible_documentation(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    filter: &DocumentationFilter,
) -> Result<Vec<Documentation>, AccessError> {
    let query = documentation_query(tx, user_id, filter).await?;
    Ok(tx.list_documentation(&query).await?)
}
