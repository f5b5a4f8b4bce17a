//! Resource pool infrastructure - connection leases and external handle caching

mod connection_pool;
mod handle_cache;
mod resource_pool;
mod sqlite;

pub use connection_pool::{ConnectionLease, ConnectionPool};
pub use handle_cache::HandleCache;
pub use resource_pool::ResourcePool;
pub use sqlite::SqliteConnectionFactory;
