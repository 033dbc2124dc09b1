//! Reference mappings consulted while building provider payloads.

use serde::{Deserialize, Serialize};

/// Maps an HR department code onto directory structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentMapping {
    /// Department code as sent by HR.
    pub source_code: String,
    /// Department code known to the directory and chat systems.
    pub directory_department_code: String,
    /// Directory org unit; directory accounts cannot be created without one.
    pub org_unit: Option<String>,
}

impl DepartmentMapping {
    /// Creates a mapping.
    #[must_use]
    pub fn new(
        source_code: impl Into<String>,
        directory_department_code: impl Into<String>,
        org_unit: Option<String>,
    ) -> Self {
        Self {
            source_code: source_code.into(),
            directory_department_code: directory_department_code.into(),
            org_unit,
        }
    }

    /// Returns the org unit when it is present and non-blank.
    #[must_use]
    pub fn usable_org_unit(&self) -> Option<&str> {
        self.org_unit
            .as_deref()
            .map(str::trim)
            .filter(|ou| !ou.is_empty())
    }
}

/// Per person-type provisioning defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonTypeMapping {
    /// HR person-type code.
    pub person_type: String,
    /// Mailbox domain, with or without a leading `@`.
    pub email_domain: String,
    /// User type sent to the directory.
    pub directory_user_type: String,
    /// Person type sent to the chat system.
    pub chat_person_type: String,
    /// Human-readable description.
    pub description: String,
}
