//! Explicit ownership-graph deletes: a project owns its tasks, memberships
//! and documentation; a task owns its documentation. Children go first so
//! no row ever points at a deleted parent.

use tracing::info;
use uuid::Uuid;

use crate::database::{DatabaseError, StoreTx};
use crate::filter::{DocumentationQuery, TaskQuery};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub tasks: usize,
    pub documentation: usize,
    pub memberships: u64,
}

/// Delete a task and the documentation anchored to it. Returns the number
/// of documentation items removed.
pub async fn delete_task(tx: &mut dyn StoreTx, task_id: Uuid) -> Result<usize, DatabaseError> {
    let docs = tx.list_documentation(&DocumentationQuery::for_task(task_id)).await?;
    for doc in &docs {
        tx.delete_documentation(doc.id).await?;
    }
    tx.delete_task(task_id).await?;
    Ok(docs.len())
}

pub async fn delete_project(tx: &mut dyn StoreTx, project_id: Uuid) -> Result<CascadeSummary, DatabaseError> {
    let mut summary = CascadeSummary::default();

    let tasks = tx.list_tasks(&TaskQuery::in_project(project_id)).await?;
    for task in &tasks {
        summary.documentation += delete_task(tx, task.id).await?;
    }
    summary.tasks = tasks.len();

    // Whatever is left is anchored to the project directly
    let docs = tx.list_documentation(&DocumentationQuery::for_project(project_id)).await?;
    for doc in &docs {
        tx.delete_documentation(doc.id).await?;
    }
    summary.documentation += docs.len();

    summary.memberships = tx.delete_memberships(project_id).await?;
    tx.delete_project(project_id).await?;

    info!(
        "Deleted project {} with {} tasks, {} documentation items, {} memberships",
        project_id, summary.tasks, summary.documentation, summary.memberships
    );
    Ok(summary)
}
