//! Authentication middleware: extracts the Bearer token, verifies it and
//! checks it against the token store.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use gatehouse_core::auth::bearer::extract_bearer_token;
use gatehouse_core::models::auth::TokenClaims;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Verified identity injected into request extensions for protected handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, requires a
/// live access token, and injects `AuthenticatedUser` into request
/// extensions. Any rejection short-circuits with 401 before the handler runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match extract_bearer_token(header) {
        Ok(token) => token.to_owned(),
        Err(_) => {
            debug!(path = %request.uri().path(), "missing or malformed authorization header");
            return Err(AppError::Unauthorized("Unauthorized".into()));
        }
    };

    let claims = state.auth.authenticate(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}
