//! User lookup handlers. Mounted behind `require_auth`.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserResponse;

/// `GET /user/me`: the authenticated user.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.auth.user(user.user_id()).await?;
    Ok(Json(user.into()))
}

/// `GET /user/{id}`: any user by numeric id.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let id = id
        .parse::<i64>()
        .map_err(|_| AppError::Validation("Invalid user ID".into()))?;
    let user = state.auth.user(id).await?;
    Ok(Json(user.into()))
}
