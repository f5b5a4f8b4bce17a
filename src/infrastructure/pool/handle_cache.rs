//! Per-credential handle cache with TTL and single-flight creation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::{info, warn};

use crate::domain::credentials::{Credential, CredentialFingerprint};
use crate::domain::pool::{HandleCacheStats, HandleFactory};
use crate::domain::DomainError;

/// Caches handles created by a [`HandleFactory`], keyed by credential fingerprint
///
/// Concurrent requests for the same fingerprint wait on one creation. Failed
/// creations are not cached; the next request tries again.
pub struct HandleCache<F: HandleFactory> {
    factory: F,
    handles: MokaCache<CredentialFingerprint, Arc<F::Handle>>,
    ttl: Duration,
    created: AtomicU64,
    failures: AtomicU64,
}

impl<F: HandleFactory> fmt::Debug for HandleCache<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleCache")
            .field("factory", &self.factory)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<F: HandleFactory> HandleCache<F> {
    pub fn new(factory: F, ttl: Duration) -> Self {
        let handles = MokaCache::builder().time_to_live(ttl).build();

        Self {
            factory,
            handles,
            ttl,
            created: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Returns a live handle for the credential, creating it if needed
    ///
    /// `None` means the external service is unavailable for this credential
    /// and the caller should proceed without it.
    pub async fn acquire(&self, credential: &Credential) -> Option<Arc<F::Handle>> {
        let fingerprint = credential.fingerprint();

        let result = self
            .handles
            .try_get_with(fingerprint.clone(), async {
                let handle = self.factory.create(credential).await.inspect_err(|_| {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                })?;

                self.created.fetch_add(1, Ordering::Relaxed);
                info!(fingerprint = %fingerprint, "Created external handle");
                Ok::<_, DomainError>(Arc::new(handle))
            })
            .await;

        match result {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(fingerprint = %fingerprint, error = %e, "External handle unavailable");
                None
            }
        }
    }

    /// Drops every cached handle
    pub async fn clear(&self) {
        self.handles.invalidate_all();
        self.handles.run_pending_tasks().await;
    }

    pub async fn stats(&self) -> HandleCacheStats {
        self.handles.run_pending_tasks().await;

        HandleCacheStats {
            cached_handles: self.handles.entry_count(),
            handle_ttl_secs: self.ttl.as_secs(),
            handles_created: self.created.load(Ordering::Relaxed),
            creation_failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
