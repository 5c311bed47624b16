//! Tab-scoped key/value storage backing the preview flags.
use crate::db;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session storage unavailable: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Session storage for one browser tab.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.write().await.remove(key);
        Ok(())
    }
}

/// SQLite-backed store for one session id, so a server-side tab survives restarts.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: db::Pool,
    session_id: String,
}

impl SqliteSessionStore {
    pub fn new(pool: db::Pool, session_id: impl Into<String>) -> Self {
        Self {
            pool,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// End of the tab session: forget every key.
    pub async fn clear(&self) -> Result<u64, StoreError> {
        Ok(db::clear_session(&self.pool, &self.session_id).await?)
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(db::get_session_value(&self.pool, &self.session_id, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(db::set_session_value(&self.pool, &self.session_id, key, value).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        Ok(db::delete_session_value(&self.pool, &self.session_id, key).await?)
    }
}
