use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::api::format::{Deleted, MemberDetail, ProjectDetail};
use crate::app::AppState;
use crate::database::models::Project;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::project_service::{self, NewMember, NewProject, ProjectChanges};

/// POST /projects - create a project owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<Project> {
    let Json(input) = payload?;

    let mut tx = state.store.begin().await?;
    let project = project_service::create(tx.as_mut(), user.user_id, input).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(project))
}

/// GET /projects - projects the caller owns or belongs to
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Project>> {
    let mut tx = state.store.begin().await?;
    let projects = project_service::list(tx.as_mut(), user.user_id).await?;
    Ok(ApiResponse::success(projects))
}

/// GET /projects/:id - project with owner, members and tasks
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<ProjectDetail> {
    let Path(id) = path?;

    let mut tx = state.store.begin().await?;
    let detail = project_service::get(tx.as_mut(), user.user_id, id).await?;
    Ok(ApiResponse::success(detail))
}

/// PUT /projects/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProjectChanges>, JsonRejection>,
) -> ApiResult<Project> {
    let Path(id) = path?;
    let Json(changes) = payload?;

    let mut tx = state.store.begin().await?;
    let project = project_service::update(tx.as_mut(), user.user_id, id, changes).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(project))
}

/// DELETE /projects/:id - owner only; removes tasks, documentation and memberships
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = path?;

    let mut tx = state.store.begin().await?;
    project_service::delete(tx.as_mut(), user.user_id, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(Deleted::new("Project")))
}

/// POST /projects/:id/members
pub async fn add_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewMember>, JsonRejection>,
) -> ApiResult<MemberDetail> {
    let Path(id) = path?;
    let Json(input) = payload?;

    let mut tx = state.store.begin().await?;
    let member = project_service::add_member(tx.as_mut(), user.user_id, id, input).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(member))
}

/// GET /projects/:id/members
pub async fn members(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Vec<MemberDetail>> {
    let Path(id) = path?;

    let mut tx = state.store.begin().await?;
    let members = project_service::members(tx.as_mut(), user.user_id, id).await?;
    Ok(ApiResponse::success(members))
}
