//! Typed, layered configuration lookup.

use super::{
    ConfigEntry, ConfigError, keys,
    ports::{ConfigStore, EnvSource},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Result type for configuration lookups.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Layered configuration service: store first, then environment.
#[derive(Clone)]
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    env: Arc<dyn EnvSource>,
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService").finish_non_exhaustive()
    }
}

impl ConfigService {
    /// Creates a service over a store and an environment source.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>, env: Arc<dyn EnvSource>) -> Self {
        Self { store, env }
    }

    /// Returns the raw value for `key` from the first layer that has it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the backing store fails.
    pub async fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        if let Some(entry) = self.store.get(key).await? {
            return Ok(Some(entry.value));
        }
        Ok(self.env.var(&key.to_ascii_uppercase()))
    }

    /// Returns the value for `key`, or `default` when no layer has it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the backing store fails.
    pub async fn get_or(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.to_owned()))
    }

    /// Returns the non-empty value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no layer has a non-blank value.
    pub async fn require(&self, key: &str) -> ConfigResult<String> {
        match self.get(key).await? {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::Missing(key.to_owned())),
        }
    }

    /// Returns `true` only when the value is `"true"` (any case).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the backing store fails.
    pub async fn get_bool(&self, key: &str, default: bool) -> ConfigResult<bool> {
        Ok(self
            .get(key)
            .await?
            .map_or(default, |value| value.trim().eq_ignore_ascii_case("true")))
    }

    /// Returns the value parsed as an integer, or `default` when absent or
    /// unparseable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the backing store fails.
    pub async fn get_int(&self, key: &str, default: i64) -> ConfigResult<i64> {
        let Some(raw) = self.get(key).await? else {
            return Ok(default);
        };
        Ok(raw.trim().parse().unwrap_or_else(|_| {
            debug!(key, value = %raw, "unparseable integer configuration, using default");
            default
        }))
    }

    /// Returns the value parsed as a non-negative `u32`, or `default`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the backing store fails.
    pub async fn get_u32(&self, key: &str, default: u32) -> ConfigResult<u32> {
        let value = self.get_int(key, i64::from(default)).await?;
        Ok(u32::try_from(value).unwrap_or(default))
    }

    /// Returns the value decoded as JSON, or `default` when absent or invalid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the backing store fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str, default: T) -> ConfigResult<T> {
        let Some(raw) = self.get(key).await? else {
            return Ok(default);
        };
        if raw.trim().is_empty() {
            return Ok(default);
        }
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            debug!(key, error = %err, "invalid JSON configuration, using default");
            default
        }))
    }

    /// Writes a value, keeping any existing description when none is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the backing store fails.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> ConfigResult<()> {
        let mut entry = ConfigEntry::new(key, value);
        if let Some(text) = description {
            entry = entry.with_description(text);
        }
        self.store.set(entry).await
    }

    /// Writes every default entry whose key is not stored yet.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the backing store fails.
    #[instrument(skip(self))]
    pub async fn seed_defaults(&self) -> ConfigResult<usize> {
        let mut written = 0;
        for entry in keys::default_entries() {
            if self.store.get(&entry.key).await?.is_some() {
                continue;
            }
            self.store.set(entry).await?;
            written += 1;
        }
        debug!(written, "seeded default configuration");
        Ok(written)
    }

    /// Lists stored entries with sensitive values masked.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the backing store fails.
    pub async fn masked_entries(&self) -> ConfigResult<Vec<ConfigEntry>> {
        let entries = self.store.list().await?;
        Ok(entries
            .into_iter()
            .map(|entry| ConfigEntry {
                value: keys::mask_value(&entry.key, &entry.value),
                ..entry
            })
            .collect())
    }
}
