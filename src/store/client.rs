use std::sync::Arc;
use std::time::Duration;

use super::{Row, Statement, StatementResult, Store};
use crate::error::{Error, Result};

/// Async, timeout-bounded handle to a [`Store`].
///
/// Calls run on tokio's blocking pool so a slow statement never parks an async
/// worker. A call that outlives the timeout surfaces as [`Error::Timeout`]; the
/// statement itself still runs to completion on the blocking thread.
#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn Store>,
    timeout: Duration,
}

impl StoreClient {
    pub fn new(store: Arc<dyn Store>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn query(&self, stmt: Statement) -> Result<Vec<Row>> {
        self.run("query", move |store| store.query(&stmt)).await
    }

    pub async fn execute(&self, stmt: Statement) -> Result<usize> {
        self.run("execute", move |store| store.execute(&stmt)).await
    }

    pub async fn batch(&self, stmts: Vec<Statement>) -> Result<Vec<StatementResult>> {
        self.run("batch", move |store| store.batch(&stmts)).await
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Store) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || f(store.as_ref()));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(Error::Unavailable(format!("{op} task failed: {e}"))),
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.timeout.as_millis() as u64, "store call timed out");
                Err(Error::Timeout(op))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    struct SlowStore;

    impl Store for SlowStore {
        fn initialize(&self) -> Result<()> {
            Ok(())
        }

        fn query(&self, _stmt: &Statement) -> Result<Vec<Row>> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(Vec::new())
        }

        fn execute(&self, _stmt: &Statement) -> Result<usize> {
            Ok(0)
        }

        fn batch(&self, _stmts: &[Statement]) -> Result<Vec<StatementResult>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_timeout_is_retryable() {
        let client = StoreClient::new(Arc::new(SlowStore), Duration::from_millis(20));
        let err = client.query(Statement::new("SELECT 1")).await.unwrap_err();
        assert!(matches!(err, Error::Timeout("query")));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_round_trip_through_blocking_pool() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        let client = StoreClient::new(Arc::new(store), Duration::from_secs(5));

        let rows = client
            .query(Statement::new("SELECT 1 AS one"))
            .await
            .unwrap();
        assert_eq!(rows[0].int_or_zero("one"), 1);
    }
}
