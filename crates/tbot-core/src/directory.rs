//! Time-bounded cache in front of the directory service.
//!
//! Lookups are cached by their exact argument (the id list for `get_users`,
//! the expression for `resolve_tags`) for a fixed TTL. Entries are recomputed
//! on expiry and never invalidated early.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use crate::{
    domain::{Distribution, User, UserId},
    ports::Directory,
    Result,
};

pub const DEFAULT_DIRECTORY_TTL: Duration = Duration::from_secs(60);

pub struct UserDirectoryCache {
    inner: Arc<dyn Directory>,
    users: Cache<Vec<UserId>, Arc<Vec<User>>>,
    tags: Cache<String, Arc<Distribution>>,
}

impl UserDirectoryCache {
    pub fn new(inner: Arc<dyn Directory>, ttl: Duration) -> Self {
        Self {
            inner,
            users: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
            tags: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl Directory for UserDirectoryCache {
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
        let key = ids.to_vec();
        if let Some(users) = self.users.get(&key).await {
            debug!(count = ids.len(), "directory cache hit for users");
            return Ok(users.as_ref().clone());
        }

        let users = self.inner.get_users(ids).await?;
        self.users.insert(key, Arc::new(users.clone())).await;
        Ok(users)
    }

    async fn resolve_tags(&self, expression: &str) -> Result<Distribution> {
        if let Some(dist) = self.tags.get(expression).await {
            debug!(expression, "directory cache hit for tags");
            return Ok(dist.as_ref().clone());
        }

        let dist = self.inner.resolve_tags(expression).await?;
        self.tags
            .insert(expression.to_string(), Arc::new(dist.clone()))
            .await;
        Ok(dist)
    }
}
