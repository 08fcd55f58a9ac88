//! `Authorization` header parsing.

use super::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// Anything other than exactly `Bearer ` followed by a non-empty token
/// without whitespace is rejected as `Unauthenticated`.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::Unauthenticated)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::Unauthenticated)?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::Unauthenticated);
    }
    Ok(token)
}
