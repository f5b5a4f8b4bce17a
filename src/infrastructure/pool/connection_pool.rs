//! Free-list connection pool with scoped leases

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::domain::pool::{ConnectionFactory, ConnectionPoolStats};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_pool_event, PoolEvent};

struct PoolInner<F: ConnectionFactory> {
    factory: F,
    free: Mutex<Vec<F::Connection>>,
    max_connections: usize,
    created: AtomicU64,
    reused: AtomicU64,
    active: AtomicU64,
}

impl<F: ConnectionFactory> PoolInner<F> {
    async fn checkout(&self) -> Result<F::Connection, DomainError> {
        let idle = self
            .free
            .lock()
            .map_err(|e| DomainError::internal(format!("Connection free-list poisoned: {}", e)))?
            .pop();

        let connection = match idle {
            Some(connection) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                record_pool_event(PoolEvent::Reused);
                connection
            }
            None => {
                let connection = self.factory.connect().await.inspect_err(|e| {
                    warn!(target = %self.factory.target(), error = %e, "Failed to open connection");
                    record_pool_event(PoolEvent::Failed);
                })?;

                let created = self.created.fetch_add(1, Ordering::Relaxed) + 1;
                record_pool_event(PoolEvent::Created);

                if created as usize > self.max_connections {
                    debug!(
                        created,
                        max_connections = self.max_connections,
                        "Connection count above advisory maximum"
                    );
                }

                connection
            }
        };

        self.active.fetch_add(1, Ordering::Relaxed);
        Ok(connection)
    }

    fn release(&self, connection: F::Connection) {
        self.active.fetch_sub(1, Ordering::Relaxed);
        record_pool_event(PoolEvent::Released);

        match self.free.lock() {
            Ok(mut free) => free.push(connection),
            Err(e) => warn!(error = %e, "Connection free-list poisoned, closing connection"),
        }
    }
}

/// Relational connection pool
///
/// Connections are handed out through [`ConnectionLease`]s. A lease binds at
/// most one connection and gives it back when dropped, whether the worker
/// returned normally, failed or was cancelled. The pool never refuses to open
/// a connection; `max_connections` is reported in stats only.
pub struct ConnectionPool<F: ConnectionFactory> {
    inner: Arc<PoolInner<F>>,
}

impl<F: ConnectionFactory> Clone for ConnectionPool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ConnectionFactory> fmt::Debug for ConnectionPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("factory", &self.inner.factory)
            .field("max_connections", &self.inner.max_connections)
            .finish()
    }
}

impl<F: ConnectionFactory> ConnectionPool<F> {
    pub fn new(factory: F, max_connections: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                factory,
                free: Mutex::new(Vec::new()),
                max_connections,
                created: AtomicU64::new(0),
                reused: AtomicU64::new(0),
                active: AtomicU64::new(0),
            }),
        }
    }

    /// Starts a lease; no connection is taken until one is asked for
    pub fn lease(&self) -> ConnectionLease<F> {
        ConnectionLease {
            pool: Arc::clone(&self.inner),
            connection: None,
        }
    }

    pub fn stats(&self) -> ConnectionPoolStats {
        let idle_connections = self.inner.free.lock().map(|free| free.len()).unwrap_or(0);

        ConnectionPoolStats {
            target: self.inner.factory.target(),
            max_connections: self.inner.max_connections,
            connections_created: self.inner.created.load(Ordering::Relaxed),
            connections_reused: self.inner.reused.load(Ordering::Relaxed),
            active_connections: self.inner.active.load(Ordering::Relaxed),
            idle_connections,
        }
    }

    /// Closes every idle connection; leased ones are unaffected
    pub fn close_idle(&self) -> usize {
        match self.inner.free.lock() {
            Ok(mut free) => {
                let closed = free.len();
                free.clear();
                closed
            }
            Err(_) => 0,
        }
    }
}

/// A worker's claim on at most one pooled connection
pub struct ConnectionLease<F: ConnectionFactory> {
    pool: Arc<PoolInner<F>>,
    connection: Option<F::Connection>,
}

impl<F: ConnectionFactory> ConnectionLease<F> {
    /// Returns the leased connection, binding one on first call
    ///
    /// Repeated calls on one lease return the same connection. Creation
    /// failures propagate and are not retried.
    pub async fn connection(&mut self) -> Result<&mut F::Connection, DomainError> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.pool.checkout().await?,
        };

        Ok(self.connection.insert(connection))
    }

    pub fn is_bound(&self) -> bool {
        self.connection.is_some()
    }
}

impl<F: ConnectionFactory> fmt::Debug for ConnectionLease<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionLease")
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl<F: ConnectionFactory> Drop for ConnectionLease<F> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.pool.release(connection);
        }
    }
}
