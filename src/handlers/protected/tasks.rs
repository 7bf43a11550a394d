use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::format::Deleted;
use crate::app::AppState;
use crate::database::models::Task;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::task_service::{self, NewTask, TaskChanges};

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub project_id: Option<Uuid>,
}

/// POST /tasks
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<Task> {
    let Json(input) = payload?;

    let mut tx = state.store.begin().await?;
    let task = task_service::create(tx.as_mut(), user.user_id, input).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(task))
}

/// GET /tasks[?project_id=] - one project's tasks, or every visible task
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> ApiResult<Vec<Task>> {
    let Query(query) = query?;

    let mut tx = state.store.begin().await?;
    let tasks = task_service::list(tx.as_mut(), user.user_id, query.project_id).await?;
    Ok(ApiResponse::success(tasks))
}

/// GET /tasks/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Task> {
    let Path(id) = path?;

    let mut tx = state.store.begin().await?;
    let task = task_service::get(tx.as_mut(), user.user_id, id).await?;
    Ok(ApiResponse::success(task))
}

/// PUT /tasks/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TaskChanges>, JsonRejection>,
) -> ApiResult<Task> {
    let Path(id) = path?;
    let Json(changes) = payload?;

    let mut tx = state.store.begin().await?;
    let task = task_service::update(tx.as_mut(), user.user_id, id, changes).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(task))
}

/// DELETE /tasks/:id - owners and admins; removes the task's documentation
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = path?;

    let mut tx = state.store.begin().await?;
    task_service::delete(tx.as_mut(), user.user_id, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(Deleted::new("Task")))
}
