//! Account provisioning task engine.
//!
//! A creation pass turns eligible persons into pending tasks, one per
//! enabled account type. Batch runs pick pending and retryable failed tasks
//! in creation order, call the identity provider for each, and either
//! complete the task with the provider's result or record the failure in
//! the task's execution log.
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
