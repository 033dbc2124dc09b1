//! Credential cache port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for credential cache operations.
pub type CredentialCacheResult<T> = Result<T, CredentialCacheError>;

/// Process-local cache of provider bearer credentials, keyed by provider.
#[async_trait]
pub trait CredentialCache: Send + Sync {
    /// Returns a cached token that is still usable.
    async fn get(&self, key: &str) -> CredentialCacheResult<Option<String>>;

    /// Caches `token` for the lifetime the provider reported.
    ///
    /// Implementations stop returning the token some margin before the
    /// lifetime ends.
    async fn put(&self, key: &str, token: &str, expires_in_secs: i64)
    -> CredentialCacheResult<()>;

    /// Drops a cached token.
    async fn invalidate(&self, key: &str) -> CredentialCacheResult<()>;
}

/// Errors returned by credential cache implementations.
#[derive(Debug, Clone, Error)]
pub enum CredentialCacheError {
    /// Backing store failure.
    #[error("credential cache error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl CredentialCacheError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
