//! Port contracts for configuration storage and environment lookup.

use super::{ConfigEntry, ConfigError};
use async_trait::async_trait;

/// Persistent key/value configuration store.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Returns the entry for `key`, if present.
    async fn get(&self, key: &str) -> Result<Option<ConfigEntry>, ConfigError>;

    /// Inserts or replaces an entry.
    ///
    /// A `None` description keeps any description already stored.
    async fn set(&self, entry: ConfigEntry) -> Result<(), ConfigError>;

    /// Lists every stored entry ordered by key.
    async fn list(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// Read-only view of process environment variables.
pub trait EnvSource: Send + Sync {
    /// Returns the value of variable `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
}
