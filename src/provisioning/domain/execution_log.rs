//! Append-only failure history for provisioning tasks.

use super::{AttemptNumber, TaskId};
use crate::identity::domain::{AccountType, EmployeeNumber};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Snapshot of the inputs a failed attempt ran with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Person the task provisions for.
    pub employee_number: EmployeeNumber,
    /// Account type being provisioned.
    pub account_type: AccountType,
    /// Department code resolved for the person, if any.
    pub department_code: Option<String>,
    /// Attempt number of the failed execution.
    pub execution_attempt: AttemptNumber,
    /// When the attempt was processed.
    pub processed_at: DateTime<Utc>,
}

/// One failed attempt of a provisioning task. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecutionLog {
    id: Uuid,
    task_id: TaskId,
    attempt: AttemptNumber,
    error_message: String,
    error_details: Value,
    execution_context: ExecutionContext,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedLogData {
    /// Persisted entry identifier.
    pub id: Uuid,
    /// Persisted task reference.
    pub task_id: TaskId,
    /// Persisted attempt number.
    pub attempt: AttemptNumber,
    /// Persisted error message.
    pub error_message: String,
    /// Persisted structured error detail.
    pub error_details: Value,
    /// Persisted execution context.
    pub execution_context: ExecutionContext,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskExecutionLog {
    /// Creates a log entry for a failed attempt.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        error_message: impl Into<String>,
        error_details: Value,
        execution_context: ExecutionContext,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            attempt: execution_context.execution_attempt,
            error_message: error_message.into(),
            error_details,
            execution_context,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a log entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedLogData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            attempt: data.attempt,
            error_message: data.error_message,
            error_details: data.error_details,
            execution_context: data.execution_context,
            created_at: data.created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the task the entry belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the attempt number.
    #[must_use]
    pub const fn attempt(&self) -> AttemptNumber {
        self.attempt
    }

    /// Returns the error message.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Returns the structured error detail.
    #[must_use]
    pub const fn error_details(&self) -> &Value {
        &self.error_details
    }

    /// Returns the execution context snapshot.
    #[must_use]
    pub const fn execution_context(&self) -> &ExecutionContext {
        &self.execution_context
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
