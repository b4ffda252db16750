use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::backend::{CacheBackend, CacheResult};

pub const DEFAULT_CAPACITY: usize = 10_000;

/// A single cached value and the instant it stops being servable.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    /// An entry is expired once the full TTL has elapsed, boundary included.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process backend. Expired entries are never returned and are purged
/// lazily on read and whenever a write pushes the map past its capacity.
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MemoryBackend {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn make_room(entries: &mut HashMap<String, CacheEntry>, capacity: usize) {
        if entries.len() < capacity {
            return;
        }

        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired_at(now));

        while entries.len() >= capacity {
            let soonest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            match soonest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries();
        let now = Instant::now();

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries();
        if !entries.contains_key(key) {
            Self::make_room(&mut entries, self.capacity);
        }
        entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<()> {
        let mut entries = self.entries();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl_boundary() {
        let backend = MemoryBackend::default();
        backend
            .set("k", "v".to_string(), Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(9_999)).await;
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_keys() {
        let backend = MemoryBackend::default();
        let ttl = Duration::from_secs(60);
        backend.set("a", "1".into(), ttl).await.unwrap();
        backend.set("b", "2".into(), ttl).await.unwrap();

        backend.delete(&["a".to_string(), "missing".to_string()]).await.unwrap();

        assert_eq!(backend.get("a").await.unwrap(), None);
        assert_eq!(backend.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_soonest_expiring() {
        let backend = MemoryBackend::new(2);
        backend.set("short", "1".into(), Duration::from_secs(5)).await.unwrap();
        backend.set("long", "2".into(), Duration::from_secs(500)).await.unwrap();
        backend.set("new", "3".into(), Duration::from_secs(50)).await.unwrap();

        assert_eq!(backend.len(), 2);
        assert_eq!(backend.get("short").await.unwrap(), None);
        assert_eq!(backend.get("long").await.unwrap().as_deref(), Some("2"));
        assert_eq!(backend.get("new").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let backend = MemoryBackend::new(1);
        backend.set("k", "1".into(), Duration::from_secs(5)).await.unwrap();
        backend.set("k", "2".into(), Duration::from_secs(5)).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("2"));
    }
}
