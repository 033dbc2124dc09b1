//! Error types for identity record validation and parsing.

use thiserror::Error;

/// Errors returned while constructing identity values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityDomainError {
    /// The employee number is empty after trimming.
    #[error("employee number must not be empty")]
    EmptyEmployeeNumber,

    /// The full name is empty after trimming.
    #[error("full name must not be empty for employee {0}")]
    EmptyFullName(String),
}

/// Error returned while parsing account types from persistence or config.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown account type: {0}")]
pub struct ParseAccountTypeError(pub String);
