//! `PostgreSQL` adapters for provisioning task persistence.
//!
//! The partial unique index `idx_provisioning_tasks_active_unique` rejects a
//! second active task for one person and account type, and failure records
//! are written in a single transaction.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskRepository, TaskPgPool};
