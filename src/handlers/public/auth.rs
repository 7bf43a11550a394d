use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::format::{TokenResponse, UserSummary};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::{self, Credentials, NewUser};

/// POST /auth/signup - register a new account
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<UserSummary> {
    let Json(input) = payload?;

    let mut tx = state.store.begin().await?;
    let user = user_service::register(tx.as_mut(), &state.identity, input).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(user))
}

/// POST /auth/token - exchange username and password for a bearer token
pub async fn token(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let Json(credentials) = payload?;

    let mut tx = state.store.begin().await?;
    let token = user_service::authenticate(tx.as_mut(), &state.identity, credentials).await?;

    tracing::info!("Issued token for user {}", token.user.id);
    Ok(ApiResponse::success(token))
}
