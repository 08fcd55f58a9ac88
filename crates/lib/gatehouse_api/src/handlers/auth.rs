//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};

use super::bearer_token;
use crate::AppState;
use crate::error::AppResult;
use crate::models::{Credentials, LogoutResponse, TokenResponse, UserResponse};

/// `POST /auth/register`: create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let Json(credentials) = body?;
    let user = state.auth.register(&credentials).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `POST /auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(credentials) = body?;
    let resp = state.auth.login(&credentials).await?;
    Ok(Json(resp))
}

/// `POST /auth/refresh`: exchange the bearer refresh token for a new access token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<TokenResponse>> {
    let token = bearer_token(&headers)?;
    let resp = state.auth.refresh(token).await?;
    Ok(Json(resp))
}

/// `POST /auth/logout`: revoke every token of the bearer's user.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<LogoutResponse>> {
    let token = bearer_token(&headers)?;
    state.auth.logout(token).await?;
    Ok(Json(LogoutResponse { success: true }))
}
