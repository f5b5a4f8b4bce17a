//! Cache domain - key-value backend abstraction and key namespaces

mod key;
mod repository;

pub use key::{CacheKeys, ContentHash};
pub use repository::{Cache, CacheExt, CacheServerInfo};
pub(crate) use repository::glob_regex;

#[cfg(test)]
pub use repository::mock::MockCache;
