//! Per-person account records and the closed set of account types.

use super::{EmployeeNumber, ParseAccountTypeError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of corporate account provisioned for a person.
///
/// Variants are declared in provisioning precedence: the mailbox address is
/// computed while the directory account is created, so directory goes first
/// and mail last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Directory / single sign-on identity.
    Directory,
    /// Enterprise chat account.
    Chat,
    /// Mailbox.
    Mail,
}

impl AccountType {
    /// Every account type in provisioning precedence.
    pub const ALL: [Self; 3] = [Self::Directory, Self::Chat, Self::Mail];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Chat => "chat",
            Self::Mail => "mail",
        }
    }

    /// Returns the type this one must wait for, if any.
    #[must_use]
    pub const fn prerequisite(self) -> Option<Self> {
        match self {
            Self::Mail => Some(Self::Directory),
            Self::Directory | Self::Chat => None,
        }
    }

    /// Sorts and deduplicates `types` into provisioning precedence.
    #[must_use]
    pub fn in_precedence(types: impl IntoIterator<Item = Self>) -> Vec<Self> {
        let mut ordered: Vec<Self> = types.into_iter().collect();
        ordered.sort_unstable();
        ordered.dedup();
        ordered
    }
}

impl TryFrom<&str> for AccountType {
    type Error = ParseAccountTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "directory" => Ok(Self::Directory),
            "chat" => Ok(Self::Chat),
            "mail" => Ok(Self::Mail),
            _ => Err(ParseAccountTypeError(value.to_owned())),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account row for one (person, account type) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    employee_number: EmployeeNumber,
    account_type: AccountType,
    identifier: Option<String>,
    is_created: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates an account row that has not been provisioned yet.
    #[must_use]
    pub fn new(
        employee_number: EmployeeNumber,
        account_type: AccountType,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            employee_number,
            account_type,
            identifier: None,
            is_created: false,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Records the provider-assigned identifier and marks the account created.
    pub fn mark_created(&mut self, identifier: Option<String>, clock: &impl Clock) {
        self.identifier = identifier;
        self.is_created = true;
        self.updated_at = clock.utc();
    }

    /// Returns the owning employee number.
    #[must_use]
    pub const fn employee_number(&self) -> &EmployeeNumber {
        &self.employee_number
    }

    /// Returns the account type.
    #[must_use]
    pub const fn account_type(&self) -> AccountType {
        self.account_type
    }

    /// Returns the provider identifier, if provisioned.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Returns `true` once the account exists in the provider.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        self.is_created
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
