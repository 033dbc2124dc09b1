//! Expiring in-memory credential cache.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::provisioning::ports::{CredentialCache, CredentialCacheResult};

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Credential cache that stops serving a token five minutes before it
/// expires.
#[derive(Debug, Clone)]
pub struct InMemoryCredentialCache<C>
where
    C: Clock + Send + Sync,
{
    tokens: Arc<RwLock<HashMap<String, CachedToken>>>,
    clock: Arc<C>,
    grace_period: Duration,
}

impl<C> InMemoryCredentialCache<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            clock,
            grace_period: Duration::minutes(5),
        }
    }
}

#[async_trait]
impl<C> CredentialCache for InMemoryCredentialCache<C>
where
    C: Clock + Send + Sync,
{
    async fn get(&self, key: &str) -> CredentialCacheResult<Option<String>> {
        let now = self.clock.utc();
        {
            let tokens = self.tokens.read().await;
            match tokens.get(key) {
                Some(cached) if now < cached.expires_at => {
                    debug!(provider = key, "using cached credential");
                    return Ok(Some(cached.token.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        self.tokens.write().await.remove(key);
        Ok(None)
    }

    async fn put(
        &self,
        key: &str,
        token: &str,
        expires_in_secs: i64,
    ) -> CredentialCacheResult<()> {
        let expires_at = self.clock.utc() + Duration::seconds(expires_in_secs) - self.grace_period;
        self.tokens.write().await.insert(
            key.to_owned(),
            CachedToken {
                token: token.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CredentialCacheResult<()> {
        self.tokens.write().await.remove(key);
        Ok(())
    }
}
