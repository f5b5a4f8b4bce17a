//! Resource pool domain - factories for pooled resources and pool stats

mod factory;
mod stats;

pub use factory::{ConnectionFactory, HandleFactory};
pub use stats::{ConnectionPoolStats, HandleCacheStats, ResourcePoolStats};

#[cfg(test)]
pub use factory::mock;
