//! Persistence seams for identities and issued tokens.
//!
//! The auth flows depend only on the [`TokenStore`] and [`UserStore`] traits.
//! [`postgres`] backs them with sqlx; [`memory`] keeps everything in process
//! for tests and local tooling.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{NewTokenRecord, NewUser, TokenRecord, TokenType, User};

pub use memory::{MemoryTokenStore, MemoryUserStore};
pub use postgres::{PgTokenStore, PgUserStore};

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    || db.is_foreign_key_violation()
                    || db.is_check_violation() =>
            {
                StoreError::ConstraintViolation(db.message().to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Issued-token persistence.
///
/// "Latest" always means most recently created; older records are superseded
/// by ordering rather than purged.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a record, returning it with the store-assigned id and timestamps.
    async fn create(&self, record: NewTokenRecord) -> Result<TokenRecord, StoreError>;

    /// Insert an access and a refresh record atomically: both or neither.
    async fn create_pair(
        &self,
        access: NewTokenRecord,
        refresh: NewTokenRecord,
    ) -> Result<(TokenRecord, TokenRecord), StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<TokenRecord, StoreError>;

    /// Most recent record for a user across both token types.
    async fn latest_by_user(&self, user_id: i64) -> Result<TokenRecord, StoreError>;

    /// Most recent record of the given type for a user.
    async fn latest_by_user_and_type(
        &self,
        user_id: i64,
        token_type: TokenType,
    ) -> Result<TokenRecord, StoreError>;

    /// All records for a user, newest first.
    async fn all_by_user(&self, user_id: i64) -> Result<Vec<TokenRecord>, StoreError>;

    /// Overwrite every column of an existing record and refresh `updated_at`.
    async fn update(&self, record: &TokenRecord) -> Result<TokenRecord, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Bulk revoke: remove every record owned by the user. Returns the count removed.
    async fn delete_all_by_user(&self, user_id: i64) -> Result<u64, StoreError>;
}

/// Identity lookup and creation.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Duplicate email or username yields `ConstraintViolation`.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}
