//! Redis caching for read-mostly catalog data.
//!
//! Category trees and the onboarding configuration are read on nearly every
//! page load and change only through admin actions, which invalidate them.
//! The cache is optional: when Redis is unreachable the service reads through
//! to PostgreSQL.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Redis cache client with connection pooling.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl RedisCache {
    /// Create a new Redis cache connection.
    pub async fn new(redis_url: &str, default_ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        tracing::info!("Redis cache connected");

        Ok(Self {
            conn,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        })
    }

    /// Get a value from cache. Errors are logged and read as a miss.
    #[instrument(skip(self), fields(cache_hit))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone();

        let hit = match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = key, error = %e, "Failed to deserialize cached value");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!(key = key, error = %e, "Redis get error");
                None
            }
        };

        tracing::Span::current().record("cache_hit", hit.is_some());
        debug!(key = key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    /// Set a value in cache with the default TTL.
    #[instrument(skip(self, value))]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut conn = self.conn.clone();

        let data = serde_json::to_string(value).context("Failed to serialize value for cache")?;

        conn.set_ex::<_, _, ()>(key, data, self.default_ttl.as_secs())
            .await
            .context("Failed to set cache value")?;

        debug!(key = key, ttl_secs = self.default_ttl.as_secs(), "Cached value");
        Ok(())
    }

    /// Delete a specific key from cache.
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();

        let deleted: i32 = conn.del(key).await.context("Failed to delete cache key")?;

        debug!(key = key, deleted = deleted > 0, "Cache delete");
        Ok(deleted > 0)
    }

    /// Check if Redis is healthy.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis health check failed")?;
        Ok(())
    }
}

/// Read through the cache: return the cached value for `key`, or run `load`
/// and cache its result. Without a cache this is just `load`.
pub async fn get_or_load<T, E, F, Fut>(cache: Option<&RedisCache>, key: &str, load: F) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(cache) = cache {
        if let Some(hit) = cache.get::<T>(key).await {
            return Ok(hit);
        }
    }

    let value = load().await?;

    if let Some(cache) = cache {
        if let Err(e) = cache.set(key, &value).await {
            warn!(key = key, error = %e, "Failed to populate cache");
        }
    }

    Ok(value)
}

/// Drop a cached key, logging failures. Used after admin writes.
pub async fn invalidate(cache: Option<&RedisCache>, key: &str) {
    if let Some(cache) = cache {
        if let Err(e) = cache.delete(key).await {
            warn!(key = key, error = %e, "Failed to invalidate cache key");
        }
    }
}

/// Cache key builders.
pub mod keys {
    pub const CATEGORY_TREE: &str = "catalog:categories:tree";
    pub const BRANDS: &str = "catalog:brands";
    pub const ONBOARDING_CONFIG: &str = "onboarding:config";
    pub const ACTIVE_LOCATIONS: &str = "locations:active";
}
