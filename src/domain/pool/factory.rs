//! Factory traits for expensive-to-create resources

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::credentials::Credential;
use crate::domain::DomainError;

/// Opens relational storage connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync + Debug + 'static {
    type Connection: Send + 'static;

    /// Opens a new connection; failures are fatal to the calling request
    async fn connect(&self) -> Result<Self::Connection, DomainError>;

    /// Human-readable target (path or URL without secrets), for stats
    fn target(&self) -> String;
}

/// Creates per-credential handles to an external service
#[async_trait]
pub trait HandleFactory: Send + Sync + Debug + 'static {
    type Handle: Send + Sync + 'static;

    /// Creates a handle bound to the real credential
    async fn create(&self, credential: &Credential) -> Result<Self::Handle, DomainError>;
}
