//! Lazily established, process-wide backend connection
//!
//! [`ConnectionCache::acquire`] hands every caller the same connection. The first
//! caller starts the connection attempt; callers arriving while it is in flight
//! await that same attempt and observe its outcome. A failed attempt is forgotten
//! so the next caller starts a fresh one.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use vidshelf_core::AppError;

/// Failure to establish the backend connection.
///
/// `Clone` so one failed attempt can be delivered to every caller awaiting it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("failed to connect to backend store: {0}")]
    Connect(String),

    #[error("failed to prepare backend store: {0}")]
    Setup(String),
}

impl From<ConnectionError> for AppError {
    fn from(err: ConnectionError) -> Self {
        AppError::ConnectionFailure(err.to_string())
    }
}

/// Establishes connections to the backend store
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Handle shared by every caller once established (e.g. a pool)
    type Connection: Clone + Send + Sync + 'static;

    async fn connect(&self) -> Result<Self::Connection, ConnectionError>;
}

type PendingConnection<T> = Shared<BoxFuture<'static, Result<T, ConnectionError>>>;

struct ConnectionState<T> {
    handle: Option<T>,
    pending: Option<PendingConnection<T>>,
}

/// Single shared backend connection, established on first use
pub struct ConnectionCache<C: Connector> {
    connector: Arc<C>,
    state: Mutex<ConnectionState<C::Connection>>,
    attempts: AtomicU64,
}

impl<C: Connector> ConnectionCache<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            state: Mutex::new(ConnectionState {
                handle: None,
                pending: None,
            }),
            attempts: AtomicU64::new(0),
        }
    }

    /// Return the shared connection, establishing it if needed.
    ///
    /// At most one connection attempt is in flight at any time.
    pub async fn acquire(&self) -> Result<C::Connection, ConnectionError> {
        let pending = {
            let mut state = self.state.lock().await;
            if let Some(handle) = &state.handle {
                return Ok(handle.clone());
            }
            match &state.pending {
                Some(pending) => {
                    tracing::debug!("Joining in-flight backend connection attempt");
                    pending.clone()
                }
                None => {
                    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::info!(attempt, "Connecting to backend store...");
                    let connector = Arc::clone(&self.connector);
                    let pending = async move { connector.connect().await }
                        .boxed()
                        .shared();
                    state.pending = Some(pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut state = self.state.lock().await;
        // Only the attempt still recorded as pending may settle the state.
        let is_current = state
            .pending
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&pending));
        if is_current {
            state.pending = None;
            match &result {
                Ok(connection) => {
                    state.handle = Some(connection.clone());
                    tracing::info!("Backend store connected");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Backend connection attempt failed");
                }
            }
        }

        result
    }

    /// Whether a connection has been established. Performs no I/O.
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.handle.is_some()
    }

    /// Number of connection attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Connector whose attempts block on a gate and resolve to scripted outcomes.
    struct GatedConnector {
        gate: Arc<Semaphore>,
        calls: Arc<AtomicU32>,
        outcomes: std::sync::Mutex<VecDeque<Result<u32, ConnectionError>>>,
    }

    impl GatedConnector {
        fn new(gate: Arc<Semaphore>, outcomes: Vec<Result<u32, ConnectionError>>) -> Self {
            Self {
                gate,
                calls: Arc::new(AtomicU32::new(0)),
                outcomes: std::sync::Mutex::new(outcomes.into()),
            }
        }
    }

    #[async_trait]
    impl Connector for GatedConnector {
        type Connection = u32;

        async fn connect(&self) -> Result<u32, ConnectionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.gate
                .acquire()
                .await
                .map_err(|e| ConnectionError::Connect(e.to_string()))?
                .forget();
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(call))
        }
    }

    fn refused() -> ConnectionError {
        ConnectionError::Connect("connection refused".to_string())
    }

    async fn acquire_concurrently(
        cache: &Arc<ConnectionCache<GatedConnector>>,
        gate: &Arc<Semaphore>,
        callers: usize,
    ) -> Vec<Result<u32, ConnectionError>> {
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let cache = Arc::clone(cache);
                tokio::spawn(async move { cache.acquire().await })
            })
            .collect();

        // Let every caller reach the in-flight attempt before it resolves.
        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.add_permits(1);

        let mut results = Vec::with_capacity(callers);
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test]
    async fn test_concurrent_acquire_makes_one_attempt() {
        let gate = Arc::new(Semaphore::new(0));
        let connector = GatedConnector::new(Arc::clone(&gate), vec![Ok(7)]);
        let calls = Arc::clone(&connector.calls);
        let cache = Arc::new(ConnectionCache::new(connector));

        let results = acquire_concurrently(&cache, &gate, 16).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.attempts(), 1);
        assert!(results.iter().all(|r| r == &Ok(7)));
        assert!(cache.is_connected().await);
    }

    #[tokio::test]
    async fn test_concurrent_failure_reaches_every_waiter() {
        let gate = Arc::new(Semaphore::new(0));
        let connector = GatedConnector::new(Arc::clone(&gate), vec![Err(refused()), Ok(9)]);
        let calls = Arc::clone(&connector.calls);
        let cache = Arc::new(ConnectionCache::new(connector));

        let results = acquire_concurrently(&cache, &gate, 8).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r == &Err(refused())));
        assert!(!cache.is_connected().await);

        // The failure is not cached: the next caller starts a fresh attempt.
        gate.add_permits(1);
        assert_eq!(cache.acquire().await, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.attempts(), 2);
    }

    #[tokio::test]
    async fn test_sequential_failure_then_retry() {
        let gate = Arc::new(Semaphore::new(10));
        let connector = GatedConnector::new(
            Arc::clone(&gate),
            vec![Err(refused()), Err(refused()), Ok(3)],
        );
        let cache = ConnectionCache::new(connector);

        assert!(cache.acquire().await.is_err());
        assert!(cache.acquire().await.is_err());
        assert_eq!(cache.acquire().await, Ok(3));
        assert_eq!(cache.attempts(), 3);
    }

    #[tokio::test]
    async fn test_established_handle_is_reused_without_io() {
        let gate = Arc::new(Semaphore::new(1));
        let connector = GatedConnector::new(Arc::clone(&gate), vec![Ok(1)]);
        let calls = Arc::clone(&connector.calls);
        let cache = ConnectionCache::new(connector);

        assert!(!cache.is_connected().await);
        assert_eq!(cache.acquire().await, Ok(1));
        // No permits left: a second attempt would hang, so reuse must skip the connector.
        for _ in 0..5 {
            assert_eq!(cache.acquire().await, Ok(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connection_error_maps_to_connection_failure() {
        let err: AppError = refused().into();
        assert!(matches!(err, AppError::ConnectionFailure(ref msg) if msg.contains("refused")));
    }
}
