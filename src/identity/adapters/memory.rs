//! In-memory identity store for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::identity::{
    domain::{
        Account, AccountType, DepartmentMapping, EmployeeNumber, Person, PersonTypeMapping,
    },
    ports::{
        AccountRepository, EmailRegistry, IdentityStoreError, IdentityStoreResult,
        MappingRepository, PersonRepository, ReservationOutcome,
    },
};

/// Thread-safe in-memory store implementing every identity port.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityStore {
    state: Arc<RwLock<InMemoryIdentityState>>,
}

#[derive(Debug, Default)]
struct InMemoryIdentityState {
    persons: BTreeMap<EmployeeNumber, Person>,
    accounts: HashMap<(EmployeeNumber, AccountType), Account>,
    departments: HashMap<String, DepartmentMapping>,
    person_types: HashMap<String, PersonTypeMapping>,
    reservations: HashMap<String, EmployeeNumber>,
    primary_addresses: HashMap<EmployeeNumber, String>,
}

impl InMemoryIdentityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> IdentityStoreResult<std::sync::RwLockReadGuard<'_, InMemoryIdentityState>> {
        self.state.read().map_err(|err| {
            IdentityStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> IdentityStoreResult<std::sync::RwLockWriteGuard<'_, InMemoryIdentityState>> {
        self.state.write().map_err(|err| {
            IdentityStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

impl InMemoryIdentityState {
    /// Whether a person other than `employee_number` already holds `key`,
    /// either as their HR address or as a provisioned mailbox.
    fn held_elsewhere(&self, key: &str, employee_number: &EmployeeNumber) -> bool {
        let hr_holder = self.persons.values().any(|person| {
            person.employee_number() != employee_number
                && person
                    .email_address()
                    .is_some_and(|held| normalize_address(held) == key)
        });
        let mailbox_holder = self.accounts.iter().any(|((owner, account_type), account)| {
            owner != employee_number
                && *account_type == AccountType::Mail
                && account
                    .identifier()
                    .is_some_and(|held| normalize_address(held) == key)
        });
        hr_holder || mailbox_holder
    }
}

#[async_trait]
impl PersonRepository for InMemoryIdentityStore {
    async fn upsert(&self, person: &Person) -> IdentityStoreResult<()> {
        let mut state = self.write()?;
        state
            .persons
            .insert(person.employee_number().clone(), person.clone());
        Ok(())
    }

    async fn find_by_employee_number(
        &self,
        employee_number: &EmployeeNumber,
    ) -> IdentityStoreResult<Option<Person>> {
        Ok(self.read()?.persons.get(employee_number).cloned())
    }

    async fn list_all(&self) -> IdentityStoreResult<Vec<Person>> {
        Ok(self.read()?.persons.values().cloned().collect())
    }

    async fn list_eligible(&self, statuses: &[String]) -> IdentityStoreResult<Vec<Person>> {
        let state = self.read()?;
        Ok(state
            .persons
            .values()
            .filter(|person| person.is_eligible(statuses))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountRepository for InMemoryIdentityStore {
    async fn save(&self, account: &Account) -> IdentityStoreResult<()> {
        let mut state = self.write()?;
        state.accounts.insert(
            (account.employee_number().clone(), account.account_type()),
            account.clone(),
        );
        Ok(())
    }

    async fn find(
        &self,
        employee_number: &EmployeeNumber,
        account_type: AccountType,
    ) -> IdentityStoreResult<Option<Account>> {
        let state = self.read()?;
        Ok(state
            .accounts
            .get(&(employee_number.clone(), account_type))
            .cloned())
    }

    async fn list_for_person(
        &self,
        employee_number: &EmployeeNumber,
    ) -> IdentityStoreResult<Vec<Account>> {
        let state = self.read()?;
        Ok(AccountType::ALL
            .iter()
            .filter_map(|account_type| {
                state
                    .accounts
                    .get(&(employee_number.clone(), *account_type))
                    .cloned()
            })
            .collect())
    }
}

#[async_trait]
impl MappingRepository for InMemoryIdentityStore {
    async fn department_mapping(
        &self,
        source_code: &str,
    ) -> IdentityStoreResult<Option<DepartmentMapping>> {
        Ok(self.read()?.departments.get(source_code).cloned())
    }

    async fn person_type_mapping(
        &self,
        person_type: &str,
    ) -> IdentityStoreResult<Option<PersonTypeMapping>> {
        Ok(self.read()?.person_types.get(person_type).cloned())
    }

    async fn save_department_mapping(
        &self,
        mapping: &DepartmentMapping,
    ) -> IdentityStoreResult<()> {
        let mut state = self.write()?;
        state
            .departments
            .insert(mapping.source_code.clone(), mapping.clone());
        Ok(())
    }

    async fn save_person_type_mapping(
        &self,
        mapping: &PersonTypeMapping,
    ) -> IdentityStoreResult<()> {
        let mut state = self.write()?;
        state
            .person_types
            .insert(mapping.person_type.clone(), mapping.clone());
        Ok(())
    }
}

#[async_trait]
impl EmailRegistry for InMemoryIdentityStore {
    async fn address_for(
        &self,
        employee_number: &EmployeeNumber,
    ) -> IdentityStoreResult<Option<String>> {
        Ok(self.read()?.primary_addresses.get(employee_number).cloned())
    }

    async fn try_reserve(
        &self,
        address: &str,
        employee_number: &EmployeeNumber,
    ) -> IdentityStoreResult<ReservationOutcome> {
        let key = normalize_address(address);
        let mut state = self.write()?;
        if let Some(owner) = state.reservations.get(&key) {
            return Ok(if owner == employee_number {
                ReservationOutcome::AlreadyOwned
            } else {
                ReservationOutcome::Taken
            });
        }
        if state.held_elsewhere(&key, employee_number) {
            return Ok(ReservationOutcome::Taken);
        }
        state.reservations.insert(key.clone(), employee_number.clone());
        state
            .primary_addresses
            .entry(employee_number.clone())
            .or_insert(key);
        Ok(ReservationOutcome::Reserved)
    }
}
