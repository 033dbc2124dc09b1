//! Repository ports for persons, accounts, mappings, and email reservations.

use crate::identity::domain::{
    Account, AccountType, DepartmentMapping, EmployeeNumber, Person, PersonTypeMapping,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity store operations.
pub type IdentityStoreResult<T> = Result<T, IdentityStoreError>;

/// Person persistence contract.
///
/// Writes come from ingestion; provisioning only reads.
#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// Inserts or replaces a person keyed by employee number.
    async fn upsert(&self, person: &Person) -> IdentityStoreResult<()>;

    /// Finds a person by employee number.
    async fn find_by_employee_number(
        &self,
        employee_number: &EmployeeNumber,
    ) -> IdentityStoreResult<Option<Person>>;

    /// Returns every person ordered by employee number.
    async fn list_all(&self) -> IdentityStoreResult<Vec<Person>>;

    /// Returns persons whose status is in `statuses` and who carry department
    /// information, ordered by employee number.
    async fn list_eligible(&self, statuses: &[String]) -> IdentityStoreResult<Vec<Person>>;
}

/// Account persistence contract.
///
/// At most one account exists per (person, account type); [`save`] replaces
/// the existing row for that pair.
///
/// [`save`]: AccountRepository::save
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts or replaces the account row for its (person, type) pair.
    async fn save(&self, account: &Account) -> IdentityStoreResult<()>;

    /// Finds the account row for a (person, type) pair.
    async fn find(
        &self,
        employee_number: &EmployeeNumber,
        account_type: AccountType,
    ) -> IdentityStoreResult<Option<Account>>;

    /// Returns every account row for a person in account-type precedence.
    async fn list_for_person(
        &self,
        employee_number: &EmployeeNumber,
    ) -> IdentityStoreResult<Vec<Account>>;
}

/// Department and person-type mapping lookups.
#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Finds the mapping for an HR department code.
    async fn department_mapping(
        &self,
        source_code: &str,
    ) -> IdentityStoreResult<Option<DepartmentMapping>>;

    /// Finds the mapping for an HR person-type code.
    async fn person_type_mapping(
        &self,
        person_type: &str,
    ) -> IdentityStoreResult<Option<PersonTypeMapping>>;

    /// Inserts or replaces a department mapping.
    async fn save_department_mapping(&self, mapping: &DepartmentMapping)
    -> IdentityStoreResult<()>;

    /// Inserts or replaces a person-type mapping.
    async fn save_person_type_mapping(
        &self,
        mapping: &PersonTypeMapping,
    ) -> IdentityStoreResult<()>;
}

/// Outcome of an email address reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// The address was free and now belongs to the requester.
    Reserved,
    /// The requester already owned the address.
    AlreadyOwned,
    /// Another person owns the address.
    Taken,
}

impl ReservationOutcome {
    /// Returns `true` when the requester owns the address afterwards.
    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(self, Self::Reserved | Self::AlreadyOwned)
    }
}

/// Registry guaranteeing each mailbox address belongs to one person.
///
/// Reservation is an atomic insert-if-absent, so two generators trying the
/// same address cannot both win it. An address already held by another
/// person, as their HR address or as a provisioned mailbox, is taken.
#[async_trait]
pub trait EmailRegistry: Send + Sync {
    /// Returns the first address reserved by a person, if any.
    async fn address_for(
        &self,
        employee_number: &EmployeeNumber,
    ) -> IdentityStoreResult<Option<String>>;

    /// Attempts to reserve `address` for a person.
    async fn try_reserve(
        &self,
        address: &str,
        employee_number: &EmployeeNumber,
    ) -> IdentityStoreResult<ReservationOutcome>;
}

/// Errors returned by identity store implementations.
#[derive(Debug, Clone, Error)]
pub enum IdentityStoreError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl IdentityStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
