//! Provisioning task aggregate and its status machine.

use super::{ParseTaskStatusError, ProvisioningResult, TaskDomainError, TaskId};
use crate::identity::domain::{AccountType, EmployeeNumber};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provisioning task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its first run.
    Pending,
    /// Claimed by a batch run.
    Processing,
    /// The account exists in the provider.
    Completed,
    /// The latest attempt failed.
    Failed,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` for statuses that block creation of another task for
    /// the same person and account type.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Processing | Self::Completed)
    }

    /// Returns `true` for statuses a batch run may pick up.
    #[must_use]
    pub const fn is_runnable(self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }

    /// Returns `true` when the status machine permits `self -> target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending | Self::Failed, Self::Processing)
                | (Self::Processing, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// What a lookup of a task's dependency found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyState {
    /// The task has no dependency.
    Independent,
    /// The dependency exists with the given status.
    Resolved(TaskStatus),
    /// The dependency reference points at no stored task.
    Missing,
}

impl DependencyState {
    /// Returns `true` when the dependency does not hold the task back.
    #[must_use]
    pub const fn is_satisfied(self) -> bool {
        matches!(self, Self::Independent | Self::Resolved(TaskStatus::Completed))
    }
}

/// Provisioning task for one (person, account type) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningTask {
    id: TaskId,
    employee_number: EmployeeNumber,
    account_type: AccountType,
    status: TaskStatus,
    depends_on: Option<TaskId>,
    result: Option<ProvisioningResult>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted provisioning task.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning person.
    pub employee_number: EmployeeNumber,
    /// Persisted account type.
    pub account_type: AccountType,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted dependency reference.
    pub depends_on: Option<TaskId>,
    /// Persisted success payload.
    pub result: Option<ProvisioningResult>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProvisioningTask {
    /// Creates a pending task.
    #[must_use]
    pub fn new(
        employee_number: EmployeeNumber,
        account_type: AccountType,
        depends_on: Option<TaskId>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            employee_number,
            account_type,
            status: TaskStatus::Pending,
            depends_on,
            result: None,
            created_at: timestamp,
            updated_at: timestamp,
            completed_at: None,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            employee_number: data.employee_number,
            account_type: data.account_type,
            status: data.status,
            depends_on: data.depends_on,
            result: data.result,
            created_at: data.created_at,
            updated_at: data.updated_at,
            completed_at: data.completed_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning person.
    #[must_use]
    pub const fn employee_number(&self) -> &EmployeeNumber {
        &self.employee_number
    }

    /// Returns the account type to provision.
    #[must_use]
    pub const fn account_type(&self) -> AccountType {
        self.account_type
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the task this one waits for, if any.
    #[must_use]
    pub const fn depends_on(&self) -> Option<TaskId> {
        self.depends_on
    }

    /// Returns the success payload of a completed task.
    #[must_use]
    pub const fn result(&self) -> Option<&ProvisioningResult> {
        self.result.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the completion timestamp.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns `true` when a batch run may start this task now.
    ///
    /// A failed task counts as pending here; the retry cap is applied when
    /// candidates are selected, not by this check.
    #[must_use]
    pub const fn can_process(&self, dependency: DependencyState) -> bool {
        self.status.is_runnable() && dependency.is_satisfied()
    }

    /// Claims the task for a run.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] unless the task
    /// is pending or failed.
    pub fn mark_processing(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Processing, clock)
    }

    /// Completes the task with the provider's success payload.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] unless the task
    /// is processing.
    pub fn mark_completed(
        &mut self,
        result: ProvisioningResult,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Completed, clock)?;
        self.result = Some(result);
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    /// Records that the current attempt failed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] unless the task
    /// is processing.
    pub fn mark_failed(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Failed, clock)
    }

    /// Returns the task to pending, clearing any success payload.
    ///
    /// This is an administrative override outside the normal status machine.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ResetWhileProcessing`] for a task that is
    /// currently processing.
    pub fn reset_to_pending(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.status == TaskStatus::Processing {
            return Err(TaskDomainError::ResetWhileProcessing(self.id));
        }
        self.status = TaskStatus::Pending;
        self.result = None;
        self.completed_at = None;
        self.touch(clock);
        Ok(())
    }

    fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
