//! Timestamp store
//!
//! Persists the global invalidation mark and each principal's cached index.
//! Every write is a full overwrite, so concurrent writers settle on last-write-wins.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::helpers::{global_mark_key, principal_built_at_key, principal_items_key};
use crate::{ContentRecord, PrincipalId, PrincipalIndex, Result, Timestamp};

#[async_trait]
pub trait TimestampStore: Send + Sync {
    async fn global_mark(&self) -> Result<Option<Timestamp>>;

    async fn set_global_mark(&self, mark: Timestamp) -> Result<()>;

    async fn principal_build_time(&self, principal: &PrincipalId) -> Result<Option<Timestamp>>;

    /// Replace a principal's items and build time together
    async fn set_principal_index(&self, principal: &PrincipalId, index: &PrincipalIndex)
        -> Result<()>;

    async fn principal_index(&self, principal: &PrincipalId) -> Result<Option<PrincipalIndex>>;
}

/// Process-local store for tests and single-node development
#[derive(Default)]
pub struct MemoryTimestampStore {
    global_mark: RwLock<Option<Timestamp>>,
    indexes: RwLock<HashMap<PrincipalId, PrincipalIndex>>,
}

impl MemoryTimestampStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimestampStore for MemoryTimestampStore {
    async fn global_mark(&self) -> Result<Option<Timestamp>> {
        Ok(*self.global_mark.read().await)
    }

    async fn set_global_mark(&self, mark: Timestamp) -> Result<()> {
        *self.global_mark.write().await = Some(mark);
        Ok(())
    }

    async fn principal_build_time(&self, principal: &PrincipalId) -> Result<Option<Timestamp>> {
        Ok(self
            .indexes
            .read()
            .await
            .get(principal)
            .map(|index| index.built_at))
    }

    async fn set_principal_index(
        &self,
        principal: &PrincipalId,
        index: &PrincipalIndex,
    ) -> Result<()> {
        self.indexes.write().await.insert(*principal, index.clone());
        Ok(())
    }

    async fn principal_index(&self, principal: &PrincipalId) -> Result<Option<PrincipalIndex>> {
        Ok(self.indexes.read().await.get(principal).cloned())
    }
}

/// Redis-backed store shared by every service instance
#[derive(Clone)]
pub struct RedisTimestampStore {
    redis: ConnectionManager,
}

impl RedisTimestampStore {
    /// Create store from Redis URL
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use content_index::RedisTimestampStore;
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// let store = RedisTimestampStore::connect("redis://localhost:6379").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self::with_manager(connection))
    }

    pub fn with_manager(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub fn manager(&self) -> ConnectionManager {
        self.redis.clone()
    }
}

#[async_trait]
impl TimestampStore for RedisTimestampStore {
    async fn global_mark(&self) -> Result<Option<Timestamp>> {
        let mut conn = self.redis.clone();
        let mark: Option<Timestamp> = conn.get(global_mark_key()).await.map_err(|e| {
            warn!(error = %e, "Failed to read global invalidation mark");
            e
        })?;
        Ok(mark)
    }

    async fn set_global_mark(&self, mark: Timestamp) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.set::<_, _, ()>(global_mark_key(), mark).await?;
        debug!(mark, "Global invalidation mark written");
        Ok(())
    }

    async fn principal_build_time(&self, principal: &PrincipalId) -> Result<Option<Timestamp>> {
        let mut conn = self.redis.clone();
        let built_at: Option<Timestamp> = conn.get(principal_built_at_key(principal)).await?;
        Ok(built_at)
    }

    async fn set_principal_index(
        &self,
        principal: &PrincipalId,
        index: &PrincipalIndex,
    ) -> Result<()> {
        let payload = serde_json::to_string(&index.items)?;

        let mut conn = self.redis.clone();
        redis::pipe()
            .atomic()
            .set(principal_items_key(principal), payload)
            .ignore()
            .set(principal_built_at_key(principal), index.built_at)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| {
                warn!(principal = %principal, error = %e, "Failed to write principal index");
                e
            })?;

        debug!(
            principal = %principal,
            items = index.items.len(),
            built_at = index.built_at,
            "Principal index written"
        );
        Ok(())
    }

    async fn principal_index(&self, principal: &PrincipalId) -> Result<Option<PrincipalIndex>> {
        let mut conn = self.redis.clone();
        let (payload, built_at): (Option<String>, Option<Timestamp>) = redis::pipe()
            .get(principal_items_key(principal))
            .get(principal_built_at_key(principal))
            .query_async(&mut conn)
            .await?;

        match (payload, built_at) {
            (Some(payload), Some(built_at)) => {
                let items: Vec<ContentRecord> = serde_json::from_str(&payload)?;
                Ok(Some(PrincipalIndex { items, built_at }))
            }
            _ => Ok(None),
        }
    }
}
