//! Configuration adapters: an in-memory store and environment sources.

use super::{
    ConfigEntry, ConfigError,
    ports::{ConfigStore, EnvSource},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory configuration store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    entries: Arc<RwLock<BTreeMap<String, ConfigEntry>>>,
}

impl InMemoryConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `(key, value)` pairs.
    #[must_use]
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = values
            .into_iter()
            .map(|(key, value)| (key.to_owned(), ConfigEntry::new(key, value)))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }
}

fn poisoned(err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Store(err.to_string())
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<ConfigEntry>, ConfigError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, entry: ConfigEntry) -> Result<(), ConfigError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let description = entry.description.clone().or_else(|| {
            entries
                .get(&entry.key)
                .and_then(|existing| existing.description.clone())
        });
        entries.insert(
            entry.key.clone(),
            ConfigEntry {
                description,
                ..entry
            },
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.values().cloned().collect())
    }
}

/// Environment source backed by the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a fixed map, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Creates an environment from `(name, value)` pairs.
    #[must_use]
    pub fn new<'a>(vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            vars: vars
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
