//! Port contracts for identity record storage.

pub mod repository;

pub use repository::{
    AccountRepository, EmailRegistry, IdentityStoreError, IdentityStoreResult, MappingRepository,
    PersonRepository, ReservationOutcome,
};
