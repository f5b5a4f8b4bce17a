//! Connection pool and handle cache behind one entry point

use std::sync::Arc;
use std::time::Duration;

use crate::domain::credentials::Credential;
use crate::domain::pool::{ConnectionFactory, HandleFactory, ResourcePoolStats};

use super::connection_pool::{ConnectionLease, ConnectionPool};
use super::handle_cache::HandleCache;

/// Pools relational connections and caches per-credential external handles
#[derive(Debug)]
pub struct ResourcePool<C: ConnectionFactory, H: HandleFactory> {
    connections: ConnectionPool<C>,
    handles: HandleCache<H>,
}

impl<C: ConnectionFactory, H: HandleFactory> ResourcePool<C, H> {
    pub fn new(
        connection_factory: C,
        max_connections: usize,
        handle_factory: H,
        handle_ttl: Duration,
    ) -> Self {
        Self {
            connections: ConnectionPool::new(connection_factory, max_connections),
            handles: HandleCache::new(handle_factory, handle_ttl),
        }
    }

    pub fn connections(&self) -> &ConnectionPool<C> {
        &self.connections
    }

    /// Starts a connection lease for the calling worker
    pub fn lease(&self) -> ConnectionLease<C> {
        self.connections.lease()
    }

    /// Cached handle for the credential, or `None` when it cannot be created
    pub async fn acquire_handle(&self, credential: &Credential) -> Option<Arc<H::Handle>> {
        self.handles.acquire(credential).await
    }

    pub async fn clear_handles(&self) {
        self.handles.clear().await;
    }

    pub async fn stats(&self) -> ResourcePoolStats {
        ResourcePoolStats {
            connections: self.connections.stats(),
            handles: self.handles.stats().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pool::mock::{MockConnectionFactory, MockHandleFactory};

    fn pool() -> ResourcePool<MockConnectionFactory, MockHandleFactory> {
        ResourcePool::new(
            MockConnectionFactory::new(),
            10,
            MockHandleFactory::new(),
            Duration::from_secs(1800),
        )
    }

    #[tokio::test]
    async fn test_stats_cover_both_resources() {
        let pool = pool();

        {
            let mut lease = pool.lease();
            lease.connection().await.unwrap();
        }
        {
            let mut lease = pool.lease();
            lease.connection().await.unwrap();
        }
        pool.acquire_handle(&Credential::new("sk-a")).await.unwrap();

        let stats = pool.stats().await;
        assert_eq!(stats.connections.connections_created, 1);
        assert_eq!(stats.connections.connections_reused, 1);
        assert_eq!(stats.connections.active_connections, 0);
        assert_eq!(stats.connections.max_connections, 10);
        assert_eq!(stats.handles.cached_handles, 1);
        assert_eq!(stats.handles.handle_ttl_secs, 1800);
    }

    #[tokio::test]
    async fn test_unavailable_handle_does_not_affect_connections() {
        let pool = pool();

        assert!(pool.acquire_handle(&Credential::new("invalid")).await.is_none());

        let mut lease = pool.lease();
        assert!(lease.connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_handles() {
        let pool = pool();
        pool.acquire_handle(&Credential::new("sk-a")).await.unwrap();

        pool.clear_handles().await;

        assert_eq!(pool.stats().await.handles.cached_handles, 0);
    }

    #[tokio::test]
    async fn test_stats_serialize_to_json() {
        let stats = pool().stats().await;
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["connections"]["target"], "mock://db");
        assert_eq!(json["handles"]["handle_ttl_secs"], 1800);
    }
}
