//! Read-through cache for catalog reads.
//!
//! [`Cache::get_cached`] checks the backend first and falls back to the
//! caller's fetch on a miss, populating the backend afterwards. Backend
//! failures of any kind (unreachable, timeout, undecodable payload) degrade to
//! a miss, so without a backend the cache is a transparent pass-through.
//! Writes and invalidations report their outcome but callers may ignore it;
//! the TTL bounds how long a failed invalidation can leave a stale entry.

mod backend;
pub mod keys;
mod memory;
mod redis_backend;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use backend::{CacheBackend, CacheError, CacheResult};
pub use memory::{CacheEntry, MemoryBackend};
pub use redis_backend::RedisBackend;

use crate::config::{CacheBackendKind, CacheConfig};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    invalidations: AtomicU64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub invalidations: u64,
}

impl CacheStats {
    /// hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct Cache {
    backend: Option<Arc<dyn CacheBackend>>,
    timeout: Duration,
    counters: Counters,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            timeout,
            counters: Counters::default(),
        }
    }

    /// A cache with no backend: every read recomputes.
    pub fn pass_through() -> Self {
        Self {
            backend: None,
            timeout: Duration::ZERO,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);

        let backend: Arc<dyn CacheBackend> = match config.effective_backend() {
            CacheBackendKind::None | CacheBackendKind::Auto => return Ok(Self::pass_through()),
            CacheBackendKind::Memory => Arc::new(MemoryBackend::new(config.capacity)),
            CacheBackendKind::Redis => {
                let url = config.url.as_deref().ok_or_else(|| {
                    Error::Config("cache.backend = \"redis\" requires cache.url".to_string())
                })?;
                let backend = RedisBackend::new(url, config.token.as_deref())
                    .map_err(|e| Error::Config(format!("invalid cache.url: {e}")))?;
                Arc::new(backend)
            }
        };

        Ok(Self::new(backend, timeout))
    }

    pub fn is_pass_through(&self) -> bool {
        self.backend.is_none()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            backend: self.backend.as_ref().map_or("none", |b| b.name()),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    ///
    /// Errors from `fetch` propagate and are never cached. Cache errors never do.
    pub async fn get_cached<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.lookup::<T>(key).await {
            return Ok(hit);
        }

        let value = fetch().await?;
        let _ = self.store(key, &value, ttl).await;
        Ok(value)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(backend) = &self.backend else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let raw = match self.bounded(backend.get(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, "cache miss");
                return None;
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key, backend = backend.name(), "cache read failed, passing through: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key, "{}", CacheError::Payload(e));
                None
            }
        }
    }

    /// Best-effort write. Failures are logged and returned for callers that care.
    pub async fn store<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };

        let result = match serde_json::to_string(value) {
            Ok(payload) => self.bounded(backend.set(key, payload, ttl)).await,
            Err(e) => Err(CacheError::Payload(e)),
        };

        if let Err(e) = &result {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(key, backend = backend.name(), "cache write failed: {e}");
        }
        result
    }

    /// Deletes `keys`. Advisory: a failure leaves entries to expire by TTL.
    pub async fn invalidate(&self, keys: &[String]) -> CacheResult<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };

        let result = self.bounded(backend.delete(keys)).await;
        match &result {
            Ok(()) => {
                self.counters
                    .invalidations
                    .fetch_add(keys.len() as u64, Ordering::Relaxed);
                tracing::debug!(?keys, "cache invalidated");
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(?keys, backend = backend.name(), "cache invalidation failed: {e}");
            }
        }
        result
    }

    async fn bounded<T>(&self, call: impl Future<Output = CacheResult<T>>) -> CacheResult<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(CacheError::Timeout))
    }
}
