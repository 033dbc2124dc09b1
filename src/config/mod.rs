//! Runtime configuration for account provisioning.
//!
//! Configuration is a process-wide key/value store with descriptions. Lookups
//! are layered: an explicit store entry wins, then the process environment
//! variable named by the upper-cased key, then the caller's default.
//!
//! - Entry and error types live here
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Typed accessors in [`service`]

pub mod adapters;
pub mod keys;
pub mod ports;
pub mod service;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use service::ConfigService;

/// One configuration key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Lookup key.
    pub key: String,
    /// Raw string value.
    pub value: String,
    /// Optional human-readable description.
    pub description: Option<String>,
}

impl ConfigEntry {
    /// Creates an entry without a description.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: None,
        }
    }

    /// Sets the entry description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Errors raised while resolving configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key has no value in any layer.
    #[error("required configuration '{0}' is missing")]
    Missing(String),

    /// A value exists but cannot be interpreted.
    #[error("configuration '{key}' is invalid: {reason}")]
    Invalid {
        /// Offending key.
        key: String,
        /// Parse failure description.
        reason: String,
    },

    /// The backing store failed.
    #[error("configuration store error: {0}")]
    Store(String),
}
