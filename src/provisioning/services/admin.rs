//! Operator-facing task administration.

use super::batch::{BatchError, BatchProcessor, BatchResult, TaskOutcome};
use crate::provisioning::{
    domain::{ProvisioningTask, TaskExecutionLog, TaskId, TaskStatus},
    ports::{TaskFilter, TaskRepository, TaskRepositoryResult},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A task with its failure history.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDetail {
    /// The task.
    pub task: ProvisioningTask,
    /// Failure log entries in attempt order.
    pub logs: Vec<TaskExecutionLog>,
    /// Number of recorded failures.
    pub retry_count: u32,
}

/// Result of one manual retry.
#[derive(Debug, Clone)]
pub enum RetryNowOutcome {
    /// The task ran.
    Ran(TaskOutcome),
    /// The task is not failed; its status is given.
    NotEligible(TaskStatus),
    /// No task has the identifier.
    NotFound,
    /// Claiming the task or storing its outcome failed.
    Error(String),
}

/// Per-task entry of a manual retry.
#[derive(Debug, Clone)]
pub struct RetryNowEntry {
    /// Selected task.
    pub task_id: TaskId,
    /// What happened.
    pub outcome: RetryNowOutcome,
}

/// A task that could not be reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRejection {
    /// Selected task.
    pub task_id: TaskId,
    /// Why it was rejected.
    pub reason: String,
}

/// Summary of a reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    /// Tasks moved back to pending.
    pub reset: usize,
    /// Tasks left unchanged.
    pub rejected: Vec<ResetRejection>,
}

/// Task listing, inspection, manual retry, and reset.
#[derive(Clone)]
pub struct TaskAdminService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    batch: BatchProcessor<R, C>,
    clock: Arc<C>,
}

impl<R, C> TaskAdminService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates an admin service running retries through `batch`.
    #[must_use]
    pub const fn new(tasks: Arc<R>, batch: BatchProcessor<R, C>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            batch,
            clock,
        }
    }

    /// Lists tasks matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn list_tasks(
        &self,
        filter: &TaskFilter,
    ) -> TaskRepositoryResult<Vec<ProvisioningTask>> {
        self.tasks.list(filter).await
    }

    /// Returns a task with its failure history.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn task_detail(&self, id: TaskId) -> TaskRepositoryResult<Option<TaskDetail>> {
        let Some(task) = self.tasks.find_by_id(id).await? else {
            return Ok(None);
        };
        let logs = self.tasks.execution_logs(id).await?;
        let retry_count = u32::try_from(logs.len()).unwrap_or(u32::MAX);
        Ok(Some(TaskDetail {
            task,
            logs,
            retry_count,
        }))
    }

    /// Runs the selected failed tasks now, ignoring the retry cap.
    ///
    /// Dependencies still apply: a task whose dependency has not completed is
    /// reported as skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Fatal`] when preflight fails or a run hits a
    /// configuration error.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn retry_now(&self, ids: &[TaskId]) -> BatchResult<Vec<RetryNowEntry>> {
        self.batch.preflight().await?;
        let max_retries = self.batch.retry_controller().max_retries().await?;

        let mut entries = Vec::with_capacity(ids.len());
        for &task_id in ids {
            let outcome = match self.tasks.find_by_id(task_id).await? {
                None => RetryNowOutcome::NotFound,
                Some(task) if task.status() != TaskStatus::Failed => {
                    RetryNowOutcome::NotEligible(task.status())
                }
                Some(task) => match self.batch.process_task(task, max_retries).await {
                    Ok(TaskOutcome::Failed { error, .. }) if error.is_fatal() => {
                        return Err(BatchError::Fatal(error));
                    }
                    Ok(outcome) => RetryNowOutcome::Ran(outcome),
                    Err(err) => {
                        warn!(%task_id, error = %err, "manual retry failed");
                        RetryNowOutcome::Error(err.to_string())
                    }
                },
            };
            entries.push(RetryNowEntry { task_id, outcome });
        }
        Ok(entries)
    }

    /// Moves the selected tasks back to pending, clearing any result.
    ///
    /// Processing tasks, unknown identifiers, and resets that would
    /// duplicate an active task are rejected individually.
    ///
    /// # Errors
    ///
    /// Returns store errors raised while loading a task.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn reset_to_pending(&self, ids: &[TaskId]) -> TaskRepositoryResult<ResetReport> {
        let mut report = ResetReport::default();
        for &task_id in ids {
            let Some(mut task) = self.tasks.find_by_id(task_id).await? else {
                report.rejected.push(ResetRejection {
                    task_id,
                    reason: "task not found".to_owned(),
                });
                continue;
            };
            if let Err(err) = task.reset_to_pending(&*self.clock) {
                report.rejected.push(ResetRejection {
                    task_id,
                    reason: err.to_string(),
                });
                continue;
            }
            match self.tasks.update(&task).await {
                Ok(()) => report.reset += 1,
                Err(err) => report.rejected.push(ResetRejection {
                    task_id,
                    reason: err.to_string(),
                }),
            }
        }
        info!(
            reset = report.reset,
            rejected = report.rejected.len(),
            "tasks reset to pending"
        );
        Ok(report)
    }
}
