use serde::Serialize;

/// Snapshot of the relational connection pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionPoolStats {
    pub target: String,
    /// Advisory only; the pool never refuses to open a connection
    pub max_connections: usize,
    pub connections_created: u64,
    pub connections_reused: u64,
    pub active_connections: u64,
    pub idle_connections: usize,
}

/// Snapshot of the per-credential handle cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandleCacheStats {
    pub cached_handles: u64,
    pub handle_ttl_secs: u64,
    pub handles_created: u64,
    pub creation_failures: u64,
}

/// Combined resource pool snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourcePoolStats {
    pub connections: ConnectionPoolStats,
    pub handles: HandleCacheStats,
}
