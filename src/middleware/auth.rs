use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{bearer_token, AuthError};
use crate::database::models::User;
use crate::error::ApiError;

/// Authenticated caller, inserted into request extensions by
/// `jwt_auth_middleware`
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// JWT authentication middleware: validates the bearer token and checks the
/// subject still exists before handing the request on
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader("Invalid Authorization header format")))
        .transpose()?;

    let token = bearer_token(header_value).map_err(|e| {
        tracing::warn!("Rejected request to {}: {}", request.uri().path(), e);
        e
    })?;
    let claims = state.identity.validate_token(token).map_err(|e| {
        tracing::warn!("Rejected token for {}: {}", request.uri().path(), e);
        e
    })?;

    // Scoped so the lookup transaction is released before the handler opens its own
    let user = {
        let mut tx = state.store.begin().await?;
        let found = tx.find_user(claims.sub).await?;
        found
    };
    let user = user.ok_or_else(|| {
        tracing::warn!("Token subject {} no longer exists", claims.sub);
        ApiError::unauthorized("Could not validate credentials")
    })?;

    request.extensions_mut().insert(AuthUser::from(user));
    Ok(next.run(request).await)
}
