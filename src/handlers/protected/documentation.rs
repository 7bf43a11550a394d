use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::api::format::{Deleted, DocumentationDetail};
use crate::app::AppState;
use crate::filter::DocumentationFilter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::documentation_service::{self, DocumentationChanges, NewDocumentation};

/// POST /documentation - attach to a project, or to a task (project derived)
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewDocumentation>, JsonRejection>,
) -> ApiResult<DocumentationDetail> {
    let Json(input) = payload?;

    let mut tx = state.store.begin().await?;
    let doc = documentation_service::create(tx.as_mut(), user.user_id, input).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(doc))
}

/// GET /documentation[?project_id&task_id&search&doc_type]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<DocumentationFilter>, QueryRejection>,
) -> ApiResult<Vec<DocumentationDetail>> {
    let Query(filter) = query?;

    let mut tx = state.store.begin().await?;
    let docs = documentation_service::list(tx.as_mut(), user.user_id, &filter).await?;
    Ok(ApiResponse::success(docs))
}

/// GET /documentation/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<DocumentationDetail> {
    let Path(id) = path?;

    let mut tx = state.store.begin().await?;
    let doc = documentation_service::get(tx.as_mut(), user.user_id, id).await?;
    Ok(ApiResponse::success(doc))
}

/// PUT /documentation/:id - author or project owner
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<DocumentationChanges>, JsonRejection>,
) -> ApiResult<DocumentationDetail> {
    let Path(id) = path?;
    let Json(changes) = payload?;

    let mut tx = state.store.begin().await?;
    let doc = documentation_service::update(tx.as_mut(), user.user_id, id, changes).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(doc))
}

/// DELETE /documentation/:id - author or project owner
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Deleted> {
    let Path(id) = path?;

    let mut tx = state.store.begin().await?;
    documentation_service::delete(tx.as_mut(), user.user_id, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(Deleted::new("Documentation")))
}
