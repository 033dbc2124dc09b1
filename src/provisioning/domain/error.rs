//! Error types for provisioning task validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while mutating provisioning task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The requested status transition is not permitted.
    #[error("task {task_id} cannot transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Task being mutated.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// A task that is currently processing cannot be reset.
    #[error("task {0} is processing and cannot be reset")]
    ResetWhileProcessing(TaskId),

    /// Attempt numbers start at one.
    #[error("invalid attempt number {0}, expected a positive integer")]
    InvalidAttemptNumber(u32),
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
