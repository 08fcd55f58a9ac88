//! Request handlers.

pub mod auth;
pub mod health;
pub mod user;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use gatehouse_core::auth::bearer::extract_bearer_token;

use crate::error::AppError;

/// Bearer token from the request's `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    extract_bearer_token(header).map_err(|_| AppError::Unauthorized("Unauthorized".into()))
}
