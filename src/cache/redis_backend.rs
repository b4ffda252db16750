use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, IntoConnectionInfo};
use tokio::sync::OnceCell;
use tokio::time::Instant;

use super::backend::{CacheBackend, CacheError, CacheResult};

/// Minimum gap between two attempts at the initial connection.
const CONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Redis backend. The connection is established on first use and the
/// resulting [`ConnectionManager`] is reused (and reconnects) from then on.
///
/// Until that first connection succeeds, attempts are spaced by
/// [`CONNECT_BACKOFF`]; calls in between fail immediately.
pub struct RedisBackend {
    client: Client,
    manager: OnceCell<ConnectionManager>,
    last_attempt: Mutex<Option<Instant>>,
}

impl RedisBackend {
    /// `password` overrides any credential embedded in `url`.
    pub fn new(url: &str, password: Option<&str>) -> CacheResult<Self> {
        let mut info = url.into_connection_info()?;
        if let Some(password) = password {
            info.redis.password = Some(password.to_string());
        }

        Ok(Self {
            client: Client::open(info)?,
            manager: OnceCell::new(),
            last_attempt: Mutex::new(None),
        })
    }

    async fn connection(&self) -> CacheResult<ConnectionManager> {
        if let Some(manager) = self.manager.get() {
            return Ok(manager.clone());
        }
        self.claim_connect_attempt()?;

        let manager = self
            .manager
            .get_or_try_init(|| async {
                tracing::info!("Connecting to redis cache backend");
                ConnectionManager::new(self.client.clone()).await
            })
            .await?;
        Ok(manager.clone())
    }

    /// The attempt is recorded before connecting, so a connect abandoned by
    /// the cache timeout still counts.
    fn claim_connect_attempt(&self) -> CacheResult<()> {
        let mut last = self
            .last_attempt
            .lock()
            .map_err(|_| CacheError::Backend("connect state poisoned".to_string()))?;
        if last.is_some_and(|at| at.elapsed() < CONNECT_BACKOFF) {
            return Err(CacheError::Backend("redis unreachable, backing off".to_string()));
        }
        *last = Some(Instant::now());
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let seconds = ttl.as_secs();
        if seconds == 0 {
            return Err(CacheError::Backend("ttl below one second".to_string()));
        }

        let mut conn = self.connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection().await?;
        redis::cmd("DEL")
            .arg(keys)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
