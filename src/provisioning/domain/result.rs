//! Success payload produced by a provider call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque success data stored on a completed task.
///
/// `account_identifier` is copied onto the person's account row; every other
/// field is provider echo kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningResult {
    account_identifier: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ProvisioningResult {
    /// Creates a result for the identifier the provider now knows.
    #[must_use]
    pub fn new(account_identifier: impl Into<String>) -> Self {
        Self {
            account_identifier: account_identifier.into(),
            extra: Map::new(),
        }
    }

    /// Adds an extra field to the payload.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns the provider account identifier.
    #[must_use]
    pub fn account_identifier(&self) -> &str {
        &self.account_identifier
    }

    /// Returns an extra field by name.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
