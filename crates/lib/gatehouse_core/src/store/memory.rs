//! In-process stores for tests and local tooling.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{StoreError, TokenStore, UserStore};
use crate::models::auth::{NewTokenRecord, NewUser, TokenRecord, TokenType, User};

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn materialize(id: i64, record: NewTokenRecord) -> TokenRecord {
    let now = Utc::now();
    TokenRecord {
        id,
        user_id: record.user_id,
        token: record.token,
        token_type: record.token_type,
        created_at: now,
        updated_at: now,
        expires_at: record.expires_at,
    }
}

/// Newest record first: by `created_at`, ties broken by the later id.
fn newest<'a>(records: impl Iterator<Item = &'a TokenRecord>) -> Option<&'a TokenRecord> {
    records.max_by_key(|r| (r.created_at, r.id))
}

/// Token store backed by a map.
///
/// A store built with [`MemoryTokenStore::with_users`] rejects records whose
/// owner is missing, like the `tokens.user_id` foreign key. One built with
/// [`MemoryTokenStore::new`] accepts any owner id.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    table: Arc<RwLock<Table<TokenRecord>>>,
    users: Option<Arc<RwLock<Table<User>>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token store whose records must belong to a user in `users`.
    pub fn with_users(users: &MemoryUserStore) -> Self {
        Self {
            table: Arc::default(),
            users: Some(users.table.clone()),
        }
    }

    async fn check_owner(&self, user_id: i64) -> Result<(), StoreError> {
        if let Some(users) = &self.users
            && !users.read().await.rows.contains_key(&user_id)
        {
            return Err(StoreError::ConstraintViolation(
                "insert or update on table \"tokens\" violates foreign key constraint \"tokens_user_id_fkey\"".into(),
            ));
        }
        Ok(())
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn create(&self, record: NewTokenRecord) -> Result<TokenRecord, StoreError> {
        self.check_owner(record.user_id).await?;
        let mut table = self.table.write().await;
        let id = table.allocate_id();
        let record = materialize(id, record);
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn create_pair(
        &self,
        access: NewTokenRecord,
        refresh: NewTokenRecord,
    ) -> Result<(TokenRecord, TokenRecord), StoreError> {
        self.check_owner(access.user_id).await?;
        self.check_owner(refresh.user_id).await?;
        let mut table = self.table.write().await;
        let access_id = table.allocate_id();
        let access = materialize(access_id, access);
        let refresh_id = table.allocate_id();
        let refresh = materialize(refresh_id, refresh);
        table.rows.insert(access_id, access.clone());
        table.rows.insert(refresh_id, refresh.clone());
        Ok((access, refresh))
    }

    async fn get_by_id(&self, id: i64) -> Result<TokenRecord, StoreError> {
        let table = self.table.read().await;
        table.rows.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn latest_by_user(&self, user_id: i64) -> Result<TokenRecord, StoreError> {
        let table = self.table.read().await;
        newest(table.rows.values().filter(|r| r.user_id == user_id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn latest_by_user_and_type(
        &self,
        user_id: i64,
        token_type: TokenType,
    ) -> Result<TokenRecord, StoreError> {
        let table = self.table.read().await;
        newest(
            table
                .rows
                .values()
                .filter(|r| r.user_id == user_id && r.token_type == token_type),
        )
        .cloned()
        .ok_or(StoreError::NotFound)
    }

    async fn all_by_user(&self, user_id: i64) -> Result<Vec<TokenRecord>, StoreError> {
        let table = self.table.read().await;
        let mut records: Vec<TokenRecord> = table
            .rows
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(records)
    }

    async fn update(&self, record: &TokenRecord) -> Result<TokenRecord, StoreError> {
        let mut table = self.table.write().await;
        let existing = table.rows.get_mut(&record.id).ok_or(StoreError::NotFound)?;
        existing.user_id = record.user_id;
        existing.token = record.token.clone();
        existing.token_type = record.token_type;
        existing.expires_at = record.expires_at;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        table
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn delete_all_by_user(&self, user_id: i64) -> Result<u64, StoreError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|_, r| r.user_id != user_id);
        Ok((before - table.rows.len()) as u64)
    }
}

/// User store backed by a map. Enforces email and username uniqueness.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
    table: Arc<RwLock<Table<User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|u| u.email == user.email) {
            return Err(StoreError::ConstraintViolation(
                "duplicate key value violates unique constraint \"users_email_key\"".into(),
            ));
        }
        if let Some(username) = &user.username
            && table
                .rows
                .values()
                .any(|u| u.username.as_deref() == Some(username.as_str()))
        {
            return Err(StoreError::ConstraintViolation(
                "duplicate key value violates unique constraint \"users_username_key\"".into(),
            ));
        }

        let id = table.allocate_id();
        let now = Utc::now();
        let user = User {
            id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }
}
