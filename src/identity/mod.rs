//! Identity records: persons, their accounts, and reference mappings.
//!
//! Persons arrive from HR ingestion and are read-only to provisioning.
//! Accounts record what each identity provider has created for a person.
//! Department and person-type mappings, plus the email reservation registry,
//! feed payload construction.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
