//! Authentication and token lifecycle logic.
//!
//! Provides the token codec, password hashing, bearer header parsing, and
//! the [`service::AuthService`] that orchestrates register, login, refresh,
//! logout and request authentication.

pub mod bearer;
pub mod jwt;
pub mod password;
pub mod service;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
///
/// `InvalidCredentials` and `Unauthenticated` both surface as 401 and are
/// deliberately not distinguished further to callers.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AuthError::NotFound,
            StoreError::ConstraintViolation(msg) => AuthError::Conflict(msg),
            StoreError::Unavailable(msg) => AuthError::Internal(msg),
        }
    }
}
