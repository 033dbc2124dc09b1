//! Person records delivered by HR ingestion.

use super::IdentityDomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Unique natural key of a person in the HR system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeNumber(String);

impl EmployeeNumber {
    /// Creates a validated employee number.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyEmployeeNumber`] when the value is
    /// blank.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityDomainError::EmptyEmployeeNumber);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the employee number as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EmployeeNumber {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmployeeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque department descriptor as delivered by ingestion.
///
/// The HR system sends a JSON list of department objects; only the first
/// element's `department_code` is meaningful to provisioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentInfo(Value);

impl DepartmentInfo {
    /// Wraps a raw descriptor.
    #[must_use]
    pub const fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Builds a descriptor holding a single department code.
    #[must_use]
    pub fn with_code(code: &str) -> Self {
        Self(serde_json::json!([{ "department_code": code }]))
    }

    /// Returns the primary department code, if the descriptor carries one.
    #[must_use]
    pub fn primary_code(&self) -> Option<&str> {
        self.0
            .as_array()?
            .first()?
            .get("department_code")?
            .as_str()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// Returns the raw descriptor.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.0
    }
}

/// Person record owned by the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    employee_number: EmployeeNumber,
    full_name: String,
    english_name: Option<String>,
    person_type: String,
    employee_status: String,
    department: Option<DepartmentInfo>,
    email_address: Option<String>,
    employee_account: Option<String>,
    telephone_numbers: Vec<String>,
    romanized_name: Option<String>,
}

impl Person {
    /// Creates a person with the fields provisioning requires.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyFullName`] when the name is blank.
    pub fn new(
        employee_number: EmployeeNumber,
        full_name: impl Into<String>,
        person_type: impl Into<String>,
        employee_status: impl Into<String>,
    ) -> Result<Self, IdentityDomainError> {
        let name = full_name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(IdentityDomainError::EmptyFullName(
                employee_number.to_string(),
            ));
        }
        Ok(Self {
            employee_number,
            full_name: trimmed.to_owned(),
            english_name: None,
            person_type: person_type.into(),
            employee_status: employee_status.into(),
            department: None,
            email_address: None,
            employee_account: None,
            telephone_numbers: Vec::new(),
            romanized_name: None,
        })
    }

    /// Sets the department descriptor.
    #[must_use]
    pub fn with_department(mut self, department: DepartmentInfo) -> Self {
        self.department = Some(department);
        self
    }

    /// Sets the English name.
    #[must_use]
    pub fn with_english_name(mut self, name: impl Into<String>) -> Self {
        self.english_name = Some(name.into());
        self
    }

    /// Sets the HR-recorded email address.
    #[must_use]
    pub fn with_email_address(mut self, email: impl Into<String>) -> Self {
        self.email_address = Some(email.into());
        self
    }

    /// Sets the HR-recorded employee account.
    #[must_use]
    pub fn with_employee_account(mut self, account: impl Into<String>) -> Self {
        self.employee_account = Some(account.into());
        self
    }

    /// Sets telephone numbers in preference order.
    #[must_use]
    pub fn with_telephone_numbers(mut self, numbers: impl IntoIterator<Item = String>) -> Self {
        self.telephone_numbers = numbers.into_iter().collect();
        self
    }

    /// Sets the romanized name recorded by HR.
    #[must_use]
    pub fn with_romanized_name(mut self, name: impl Into<String>) -> Self {
        self.romanized_name = Some(name.into());
        self
    }

    /// Returns the employee number.
    #[must_use]
    pub const fn employee_number(&self) -> &EmployeeNumber {
        &self.employee_number
    }

    /// Returns the native-script full name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the English name, if any.
    #[must_use]
    pub fn english_name(&self) -> Option<&str> {
        self.english_name.as_deref()
    }

    /// Returns the person-type code.
    #[must_use]
    pub fn person_type(&self) -> &str {
        &self.person_type
    }

    /// Returns the employment status code.
    #[must_use]
    pub fn employee_status(&self) -> &str {
        &self.employee_status
    }

    /// Returns the department descriptor, if any.
    #[must_use]
    pub const fn department(&self) -> Option<&DepartmentInfo> {
        self.department.as_ref()
    }

    /// Returns the primary department code, if resolvable.
    #[must_use]
    pub fn department_code(&self) -> Option<&str> {
        self.department.as_ref().and_then(DepartmentInfo::primary_code)
    }

    /// Returns the HR-recorded email address, if any.
    #[must_use]
    pub fn email_address(&self) -> Option<&str> {
        self.email_address.as_deref()
    }

    /// Returns the HR-recorded employee account, if any.
    #[must_use]
    pub fn employee_account(&self) -> Option<&str> {
        self.employee_account.as_deref()
    }

    /// Returns the first non-blank telephone number, or an empty string.
    #[must_use]
    pub fn primary_phone(&self) -> &str {
        self.telephone_numbers
            .iter()
            .map(|number| number.trim())
            .find(|number| !number.is_empty())
            .unwrap_or_default()
    }

    /// Returns the HR-recorded romanized name, if any.
    #[must_use]
    pub fn romanized_name(&self) -> Option<&str> {
        self.romanized_name.as_deref()
    }

    /// Returns `true` when the person may receive provisioning tasks.
    #[must_use]
    pub fn is_eligible(&self, valid_statuses: &[String]) -> bool {
        self.department.is_some()
            && valid_statuses
                .iter()
                .any(|status| status == &self.employee_status)
    }
}
