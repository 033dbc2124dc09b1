//! Adapter implementations for identity record ports.

pub mod memory;

pub use memory::InMemoryIdentityStore;
