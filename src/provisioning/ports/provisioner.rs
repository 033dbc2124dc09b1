//! Provisioner port and the typed failure it reports.

use super::TransportError;
use crate::config::ConfigError;
use crate::identity::domain::{AccountType, EmployeeNumber, Person};
use crate::identity::ports::IdentityStoreError;
use crate::provisioning::domain::ProvisioningResult;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

/// Provider call in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStage {
    /// Bearer credential exchange.
    Credential,
    /// Account provisioning call.
    Provision,
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Credential => "credential exchange",
            Self::Provision => "provisioning",
        })
    }
}

/// Typed failure of a single provisioning attempt.
#[derive(Debug, Clone, Error)]
pub enum ProvisioningError {
    /// A required setting is missing or invalid. Fatal for the run.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The person carries no usable department code.
    #[error("employee {0} has no resolvable department code")]
    MissingDepartment(EmployeeNumber),

    /// The department has no mapping with a directory org unit.
    #[error("department {department_code} has no directory org unit mapping")]
    MappingMissing {
        /// HR department code.
        department_code: String,
    },

    /// The task's person no longer exists.
    #[error("employee {0} not found")]
    PersonNotFound(EmployeeNumber),

    /// No mailbox address could be reserved.
    #[error("no free mailbox address for {local_part} at {domain}")]
    EmailExhausted {
        /// Romanized local part.
        local_part: String,
        /// Mailbox domain.
        domain: String,
    },

    /// The provider could not be reached.
    #[error("{provider} {stage} failed: {source}")]
    Transport {
        /// Provider called.
        provider: AccountType,
        /// Call that failed.
        stage: CallStage,
        /// Transport failure.
        source: TransportError,
    },

    /// The provider answered with a failure status or envelope.
    #[error("{provider} {stage} rejected (HTTP {status}): {message}")]
    Rejected {
        /// Provider called.
        provider: AccountType,
        /// Call that failed.
        stage: CallStage,
        /// HTTP status.
        status: u16,
        /// Provider message or envelope code.
        message: String,
        /// Full response body.
        body: Value,
    },

    /// The provider reported success without the expected fields.
    #[error("{provider} {stage} response malformed: {reason}")]
    MalformedResponse {
        /// Provider called.
        provider: AccountType,
        /// Call that failed.
        stage: CallStage,
        /// What was missing or wrong.
        reason: String,
        /// Full response body.
        body: Value,
    },

    /// Identity lookups failed.
    #[error(transparent)]
    Identity(#[from] IdentityStoreError),
}

impl ProvisioningError {
    /// Returns `true` for failures that abort the whole run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns a stable machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::MissingDepartment(_) => "missing_department",
            Self::MappingMissing { .. } => "mapping_missing",
            Self::PersonNotFound(_) => "person_not_found",
            Self::EmailExhausted { .. } => "email_exhausted",
            Self::Transport { .. } => "transport",
            Self::Rejected { .. } => "rejected",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Identity(_) => "identity_store",
        }
    }

    /// Returns the structured diagnostic stored in the failure log.
    #[must_use]
    pub fn detail(&self) -> Value {
        let mut detail = json!({ "kind": self.kind(), "message": self.to_string() });
        let extra = match self {
            Self::MappingMissing { department_code } => {
                json!({ "department_code": department_code })
            }
            Self::Transport {
                provider, stage, ..
            } => json!({ "provider": provider, "stage": stage }),
            Self::Rejected {
                provider,
                stage,
                status,
                body,
                ..
            } => json!({ "provider": provider, "stage": stage, "status": status, "response": body }),
            Self::MalformedResponse {
                provider,
                stage,
                body,
                ..
            } => json!({ "provider": provider, "stage": stage, "response": body }),
            _ => Value::Null,
        };
        if let (Value::Object(target), Value::Object(fields)) = (&mut detail, extra) {
            target.extend(fields);
        }
        detail
    }
}

/// Provisions one account for one person.
#[async_trait]
pub trait AccountProvisioner: Send + Sync {
    /// Verifies every setting the enabled account types need.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Configuration`] when a setting is absent.
    async fn preflight(&self) -> Result<(), ProvisioningError>;

    /// Creates the account in the provider for `account_type`.
    ///
    /// No retry happens here; callers record failures.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] describing why the attempt failed.
    async fn provision(
        &self,
        person: &Person,
        account_type: AccountType,
        department_code: &str,
    ) -> Result<ProvisioningResult, ProvisioningError>;
}
