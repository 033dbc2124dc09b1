//! Repository port for provisioning tasks and their failure history.

use crate::identity::domain::{AccountType, EmployeeNumber};
use crate::provisioning::domain::{
    AttemptNumber, ProvisioningTask, TaskExecutionLog, TaskId, TaskStatus,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Criteria for administrative task listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restrict to one status.
    pub status: Option<TaskStatus>,
    /// Restrict to one account type.
    pub account_type: Option<AccountType>,
    /// Restrict to one person.
    pub employee_number: Option<EmployeeNumber>,
}

impl TaskFilter {
    /// Returns `true` when `task` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, task: &ProvisioningTask) -> bool {
        self.status.is_none_or(|status| task.status() == status)
            && self
                .account_type
                .is_none_or(|account_type| task.account_type() == account_type)
            && self
                .employee_number
                .as_ref()
                .is_none_or(|number| task.employee_number() == number)
    }
}

/// A runnable task together with its recorded failure count.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCandidate {
    /// The candidate task.
    pub task: ProvisioningTask,
    /// Number of failure log entries recorded for the task.
    pub retry_count: u32,
}

/// Provisioning task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the identifier
    /// already exists or [`TaskRepositoryError::DuplicateActiveTask`] when an
    /// active task already exists for the same person and account type.
    async fn store(&self, task: &ProvisioningTask) -> TaskRepositoryResult<()>;

    /// Persists status, result, and timestamp changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or [`TaskRepositoryError::DuplicateActiveTask`] when the change would
    /// leave two active tasks for the same pair.
    async fn update(&self, task: &ProvisioningTask) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<ProvisioningTask>>;

    /// Finds the active task for a (person, account type) pair.
    async fn find_active(
        &self,
        employee_number: &EmployeeNumber,
        account_type: AccountType,
    ) -> TaskRepositoryResult<Option<ProvisioningTask>>;

    /// Returns pending and failed tasks, oldest first, keeping pending tasks
    /// and failed tasks with fewer than `max_retries` failures, capped at
    /// `limit`.
    async fn find_candidates(
        &self,
        max_retries: u32,
        limit: usize,
    ) -> TaskRepositoryResult<Vec<TaskCandidate>>;

    /// Appends a failure log entry and stores the failed task in one step.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::AttemptConflict`] when the entry's
    /// attempt is not the recorded failure count plus one, and
    /// [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn record_failure(
        &self,
        task: &ProvisioningTask,
        log: &TaskExecutionLog,
    ) -> TaskRepositoryResult<()>;

    /// Returns a task's failure history in attempt order.
    async fn execution_logs(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskExecutionLog>>;

    /// Returns the number of failures recorded for a task.
    async fn failure_count(&self, id: TaskId) -> TaskRepositoryResult<u32>;

    /// Returns tasks matching `filter`, newest first.
    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<ProvisioningTask>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// An active task already exists for the person and account type.
    #[error("an active {account_type} task already exists for employee {employee_number}")]
    DuplicateActiveTask {
        /// Owning person.
        employee_number: EmployeeNumber,
        /// Account type.
        account_type: AccountType,
    },

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The failure log entry does not follow the recorded history.
    #[error("task {task_id} expected attempt {expected}, got {actual}")]
    AttemptConflict {
        /// Task being recorded.
        task_id: TaskId,
        /// Attempt the history requires next.
        expected: AttemptNumber,
        /// Attempt carried by the entry.
        actual: AttemptNumber,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
