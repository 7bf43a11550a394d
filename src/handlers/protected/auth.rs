use axum::{extract::State, Extension};

use crate::api::format::UserSummary;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service;

/// GET /auth/me
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserSummary> {
    let mut tx = state.store.begin().await?;
    let summary = user_service::me(tx.as_mut(), user.user_id).await?;
    Ok(ApiResponse::success(summary))
}
