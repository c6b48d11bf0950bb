//! Command Executor
//!
//! Maps parsed commands onto record store calls and turns the outcome into a
//! [`Response`].
//!
//! ## Serialization
//!
//! Every executor clone shares one store handle behind one
//! `tokio::sync::Mutex`. All four commands take that lock for their whole
//! read-check-write sequence, so store operations are totally ordered:
//!
//! ```text
//!  conn 1 ──PUT──┐
//!  conn 2 ──GET──┼──> [ Mutex<Box<dyn RecordStore>> ] ──> store
//!  conn 3 ──LIST─┘         one caller at a time
//! ```
//!
//! The guard is dropped on every return path, including store errors and
//! panics inside the store. Waiting for the lock suspends the calling task.
//! Store calls are synchronous (SQLite does file I/O), so each one runs on
//! tokio's blocking pool with an owned guard moved into it; runtime workers
//! keep serving other connections meanwhile. Fairness between waiters is
//! whatever tokio's mutex provides.

use crate::protocol::{Command, CommandError, Response, Verb};
use crate::storage::{RecordStore, StoreError, StoreResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, warn};

/// A record store shared between connections.
pub type SharedStore = Arc<Mutex<Box<dyn RecordStore>>>;

/// Executes commands against the shared record store.
///
/// Cloning is cheap; every clone serializes through the same lock.
#[derive(Clone)]
pub struct CommandExecutor {
    store: SharedStore,
}

impl CommandExecutor {
    /// Creates an executor that takes ownership of `store`.
    pub fn new(store: impl RecordStore + 'static) -> Self {
        Self::from_boxed(Box::new(store))
    }

    /// Creates an executor from a store chosen at runtime.
    pub fn from_boxed(store: Box<dyn RecordStore>) -> Self {
        Self::from_shared(Arc::new(Mutex::new(store)))
    }

    /// Creates an executor over an already shared store.
    pub fn from_shared(store: SharedStore) -> Self {
        Self { store }
    }

    /// Returns the shared store handle.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Executes a command and returns the response.
    ///
    /// Failures come back as [`Response::Error`]; this never panics on store
    /// errors and never leaves the lock held.
    pub async fn execute(&self, command: Command) -> Response {
        debug!(
            command = %command.verb(),
            mutating = command.is_mutating(),
            "Executing command"
        );

        let result = match command {
            Command::Put { key, value } => self.put(key, value).await,
            Command::Get { key } => self.get(key).await,
            Command::Delete { key } => self.delete(key).await,
            Command::List => self.list().await,
        };

        result.unwrap_or_else(Response::Error)
    }

    async fn put(&self, key: String, value: String) -> Result<Response, CommandError> {
        self.with_store(Verb::Put, move |store| {
            if store.exists(&key)? {
                store.update(&key, &value)?;
                Ok(Response::Updated { key, value })
            } else {
                store.insert(&key, &value)?;
                Ok(Response::Inserted { key, value })
            }
        })
        .await
    }

    async fn get(&self, key: String) -> Result<Response, CommandError> {
        let lookup = key.clone();

        match self.with_store(Verb::Get, move |store| store.get(&lookup)).await? {
            Some(value) => Ok(Response::Value(value)),
            None => Err(CommandError::NotFound(key)),
        }
    }

    async fn delete(&self, key: String) -> Result<Response, CommandError> {
        self.with_store(Verb::Delete, move |store| {
            store.delete(&key)?;
            Ok(Response::Deleted(key))
        })
        .await
    }

    async fn list(&self) -> Result<Response, CommandError> {
        let entries = self.with_store(Verb::List, |store| store.list()).await?;
        Ok(Response::List(entries))
    }

    /// Runs `op` against the store while holding the lock.
    ///
    /// The guard travels into a blocking-pool thread together with `op`, so
    /// the lock is held for exactly as long as the store call runs.
    async fn with_store<T, F>(&self, verb: Verb, op: F) -> Result<T, CommandError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Box<dyn RecordStore>) -> StoreResult<T> + Send + 'static,
    {
        let mut store = Arc::clone(&self.store).lock_owned().await;

        match task::spawn_blocking(move || op(&mut *store)).await {
            Ok(result) => result.map_err(|e| store_failure(verb, e)),
            Err(e) => {
                warn!(command = %verb, error = %e, "Record store call aborted");
                Err(CommandError::StoreFailure)
            }
        }
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor").finish_non_exhaustive()
    }
}

/// Logs the store error and replaces it with the generic client-facing one.
fn store_failure(verb: Verb, err: StoreError) -> CommandError {
    warn!(command = %verb, error = %err, "Record store failure");
    CommandError::StoreFailure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse, ParseError};
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn create_executor() -> CommandExecutor {
        CommandExecutor::new(MemoryStore::new())
    }

    async fn run(executor: &CommandExecutor, line: &str) -> Response {
        match parse(line) {
            Ok(cmd) => executor.execute(cmd).await,
            Err(e) => Response::from(e),
        }
    }

    /// A store whose every call fails.
    struct FailingStore;

    impl RecordStore for FailingStore {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        fn exists(&self, _key: &str) -> StoreResult<bool> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        fn insert(&mut self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        fn update(&mut self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        fn delete(&mut self, _key: &str) -> StoreResult<()> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        fn list(&self) -> StoreResult<Vec<(String, String)>> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    /// Wraps a memory store and records how many writes overlap.
    struct OverlapStore {
        inner: MemoryStore,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl OverlapStore {
        fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(1));
        }

        fn exit(&self) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl RecordStore for OverlapStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key)
        }
        fn exists(&self, key: &str) -> StoreResult<bool> {
            self.inner.exists(key)
        }
        fn insert(&mut self, key: &str, value: &str) -> StoreResult<()> {
            self.enter();
            let result = self.inner.insert(key, value);
            self.exit();
            result
        }
        fn update(&mut self, key: &str, value: &str) -> StoreResult<()> {
            self.enter();
            let result = self.inner.update(key, value);
            self.exit();
            result
        }
        fn delete(&mut self, key: &str) -> StoreResult<()> {
            self.enter();
            let result = self.inner.delete(key);
            self.exit();
            result
        }
        fn list(&self) -> StoreResult<Vec<(String, String)>> {
            self.inner.list()
        }
    }

    /// Answers every read after a fixed stall.
    struct SlowStore(Duration);

    impl RecordStore for SlowStore {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            std::thread::sleep(self.0);
            Ok(Some("slow".to_string()))
        }
        fn exists(&self, _key: &str) -> StoreResult<bool> {
            std::thread::sleep(self.0);
            Ok(true)
        }
        fn insert(&mut self, _key: &str, _value: &str) -> StoreResult<()> {
            Ok(())
        }
        fn update(&mut self, _key: &str, _value: &str) -> StoreResult<()> {
            Ok(())
        }
        fn delete(&mut self, _key: &str) -> StoreResult<()> {
            Ok(())
        }
        fn list(&self) -> StoreResult<Vec<(String, String)>> {
            std::thread::sleep(self.0);
            Ok(Vec::new())
        }
    }

    /// A store that panics on LIST.
    struct PanickingStore(MemoryStore);

    impl RecordStore for PanickingStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.0.get(key)
        }
        fn exists(&self, key: &str) -> StoreResult<bool> {
            self.0.exists(key)
        }
        fn insert(&mut self, key: &str, value: &str) -> StoreResult<()> {
            self.0.insert(key, value)
        }
        fn update(&mut self, key: &str, value: &str) -> StoreResult<()> {
            self.0.update(key, value)
        }
        fn delete(&mut self, key: &str) -> StoreResult<()> {
            self.0.delete(key)
        }
        fn list(&self) -> StoreResult<Vec<(String, String)>> {
            panic!("table scan exploded");
        }
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let executor = create_executor();
        assert_eq!(
            run(&executor, "GET nothing").await,
            Response::Error(CommandError::NotFound("nothing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let executor = create_executor();

        assert_eq!(
            run(&executor, "PUT foo bar").await,
            Response::Inserted {
                key: "foo".to_string(),
                value: "bar".to_string()
            }
        );
        assert_eq!(
            run(&executor, "GET foo").await,
            Response::Value("bar".to_string())
        );
    }

    #[tokio::test]
    async fn test_second_put_updates() {
        let executor = create_executor();

        run(&executor, "PUT k v1").await;
        assert_eq!(
            run(&executor, "PUT k v2").await,
            Response::Updated {
                key: "k".to_string(),
                value: "v2".to_string()
            }
        );
        assert_eq!(
            run(&executor, "GET k").await,
            Response::Value("v2".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let executor = create_executor();

        assert_eq!(
            run(&executor, "DELETE ghost").await,
            Response::Deleted("ghost".to_string())
        );

        run(&executor, "PUT foo bar").await;
        assert_eq!(
            run(&executor, "DELETE foo").await,
            Response::Deleted("foo".to_string())
        );
        assert!(run(&executor, "GET foo").await.is_error());
        assert_eq!(
            run(&executor, "DELETE foo").await,
            Response::Deleted("foo".to_string())
        );
    }

    #[tokio::test]
    async fn test_list_contains_all_entries() {
        let executor = create_executor();

        run(&executor, "PUT b 2").await;
        run(&executor, "PUT a 1").await;

        match run(&executor, "LIST").await {
            Response::List(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(entries.contains(&("a".to_string(), "1".to_string())));
                assert!(entries.contains(&("b".to_string(), "2".to_string())));
            }
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_value_does_not_mutate() {
        let executor = create_executor();

        assert_eq!(
            run(&executor, "PUT onlykey").await,
            Response::Error(CommandError::Parse(ParseError::MissingArgument(
                Verb::Put
            )))
        );
        assert_eq!(run(&executor, "LIST").await, Response::List(Vec::new()));
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_and_lock_released() {
        let executor = CommandExecutor::new(FailingStore);

        for line in ["PUT a 1", "GET a", "DELETE a", "LIST"] {
            assert_eq!(
                run(&executor, line).await,
                Response::Error(CommandError::StoreFailure),
                "line: {}",
                line
            );
        }

        // The lock must be free after the failures above
        assert!(executor.store().try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_slow_store_does_not_stall_runtime() {
        // Single-threaded runtime: a store call on the worker would starve the ticker
        let executor = CommandExecutor::new(SlowStore(Duration::from_millis(200)));
        let ticks = Arc::new(AtomicUsize::new(0));

        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let response = run(&executor, "GET k").await;
        ticker.abort();

        assert_eq!(response, Response::Value("slow".to_string()));
        let ticks = ticks.load(Ordering::SeqCst);
        assert!(ticks >= 5, "runtime stalled during store call: {} ticks", ticks);
    }

    #[tokio::test]
    async fn test_store_panic_is_reported_and_lock_released() {
        let executor = CommandExecutor::new(PanickingStore(MemoryStore::new()));

        run(&executor, "PUT a 1").await;
        assert_eq!(
            run(&executor, "LIST").await,
            Response::Error(CommandError::StoreFailure)
        );

        assert!(executor.store().try_lock().is_ok());
        assert_eq!(
            run(&executor, "GET a").await,
            Response::Value("1".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_same_key() {
        let executor = create_executor();

        let mut tasks = Vec::new();
        for i in 0..32 {
            let executor = executor.clone();
            tasks.push(tokio::spawn(async move {
                run(&executor, &format!("PUT shared value{}", i)).await
            }));
        }

        let mut inserted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Response::Inserted { .. } => inserted += 1,
                Response::Updated { .. } => {}
                other => panic!("Unexpected response {:?}", other),
            }
        }
        assert_eq!(inserted, 1);

        match run(&executor, "GET shared").await {
            Response::Value(v) => {
                let n: usize = v.trim_start_matches("value").parse().unwrap();
                assert!(n < 32);
            }
            other => panic!("Expected value, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_writes_never_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let executor = CommandExecutor::new(OverlapStore {
            inner: MemoryStore::new(),
            in_flight: Arc::clone(&in_flight),
            max_in_flight: Arc::clone(&max_in_flight),
        });

        let mut tasks = Vec::new();
        for i in 0..16 {
            let executor = executor.clone();
            tasks.push(tokio::spawn(async move {
                run(&executor, &format!("PUT key{} v", i % 4)).await;
                run(&executor, &format!("DELETE key{}", i % 3)).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }
}
