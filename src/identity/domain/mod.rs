//! Domain model for identity records.
//!
//! Persons and their per-type accounts are leaf data: ingestion writes them,
//! provisioning reads persons and upserts accounts.

mod account;
mod error;
mod mapping;
mod person;

pub use account::{Account, AccountType};
pub use error::{IdentityDomainError, ParseAccountTypeError};
pub use mapping::{DepartmentMapping, PersonTypeMapping};
pub use person::{DepartmentInfo, EmployeeNumber, Person};
