//! In-memory adapters for tests and single-process deployments.

mod credential_cache;
mod task;

pub use credential_cache::InMemoryCredentialCache;
pub use task::InMemoryTaskRepository;
