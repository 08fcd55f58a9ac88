//! PostgreSQL-backed stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use super::{StoreError, TokenStore, UserStore};
use crate::models::auth::{NewTokenRecord, NewUser, TokenRecord, TokenType, User};

const TOKEN_COLUMNS: &str = "id, user_id, token, token_type, created_at, updated_at, expires_at";

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at, updated_at";

/// Raw `tokens` row; `token_type` is stored as text.
#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    id: i64,
    user_id: i64,
    token: String,
    token_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for TokenRecord {
    type Error = StoreError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let token_type = row
            .token_type
            .parse::<TokenType>()
            .map_err(StoreError::Unavailable)?;
        Ok(TokenRecord {
            id: row.id,
            user_id: row.user_id,
            token: row.token,
            token_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
        })
    }
}

async fn insert_token<'e>(
    executor: impl PgExecutor<'e>,
    record: &NewTokenRecord,
) -> Result<TokenRecord, StoreError> {
    let row = sqlx::query_as::<_, TokenRow>(&format!(
        "INSERT INTO tokens (user_id, token, token_type, expires_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {TOKEN_COLUMNS}"
    ))
    .bind(record.user_id)
    .bind(&record.token)
    .bind(record.token_type.as_str())
    .bind(record.expires_at)
    .fetch_one(executor)
    .await?;
    row.try_into()
}

/// Token records in the `tokens` table.
#[derive(Clone, Debug)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn create(&self, record: NewTokenRecord) -> Result<TokenRecord, StoreError> {
        insert_token(&self.pool, &record).await
    }

    async fn create_pair(
        &self,
        access: NewTokenRecord,
        refresh: NewTokenRecord,
    ) -> Result<(TokenRecord, TokenRecord), StoreError> {
        let mut tx = self.pool.begin().await?;
        let access = insert_token(&mut *tx, &access).await?;
        let refresh = insert_token(&mut *tx, &refresh).await?;
        tx.commit().await?;
        Ok((access, refresh))
    }

    async fn get_by_id(&self, id: i64) -> Result<TokenRecord, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn latest_by_user(&self, user_id: i64) -> Result<TokenRecord, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn latest_by_user_and_type(
        &self,
        user_id: i64,
        token_type: TokenType,
    ) -> Result<TokenRecord, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens \
             WHERE user_id = $1 AND token_type = $2 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(token_type.as_str())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn all_by_user(&self, user_id: i64) -> Result<Vec<TokenRecord>, StoreError> {
        let rows = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TokenRecord::try_from).collect()
    }

    async fn update(&self, record: &TokenRecord) -> Result<TokenRecord, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "UPDATE tokens \
             SET user_id = $1, token = $2, token_type = $3, expires_at = $4, \
                 updated_at = CURRENT_TIMESTAMP \
             WHERE id = $5 \
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(record.user_id)
        .bind(&record.token)
        .bind(record.token_type.as_str())
        .bind(record.expires_at)
        .bind(record.id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_by_user(&self, user_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Identities in the `users` table.
#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, username, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
