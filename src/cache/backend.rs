use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache call timed out")]
    Timeout,

    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("malformed cache payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Cache backend trait for pluggable key/value stores.
///
/// Values are opaque strings; serialization happens in [`super::Cache`].
/// Implementations must never return a value past its TTL.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, keys: &[String]) -> CacheResult<()>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
