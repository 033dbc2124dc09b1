//! Retry and failure controller.

use super::settings;
use crate::config::{ConfigError, ConfigService};
use crate::provisioning::{
    domain::{AttemptNumber, ExecutionContext, ProvisioningTask, TaskDomainError, TaskExecutionLog},
    ports::{ProvisioningError, TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{instrument, warn};

/// What recording a failure decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    /// Attempt number written to the failure log.
    pub attempt: AttemptNumber,
    /// Retry cap in force.
    pub max_retries: u32,
    /// Whether a later batch will pick the task up again.
    pub will_retry: bool,
}

/// Service-level errors for failure recording.
#[derive(Debug, Error)]
pub enum RetryControllerError {
    /// The task could not be marked failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The failure record could not be written.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The retry cap could not be read.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

/// Result type for retry controller operations.
pub type RetryControllerResult<T> = Result<T, RetryControllerError>;

/// Returns `true` while `retry_count` failures still leave room for another
/// attempt.
#[must_use]
pub const fn should_retry(retry_count: u32, max_retries: u32) -> bool {
    retry_count < max_retries
}

/// Records failed attempts and applies the retry cap.
#[derive(Clone)]
pub struct RetryController<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    config: ConfigService,
    clock: Arc<C>,
}

impl<R, C> RetryController<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new controller.
    #[must_use]
    pub const fn new(repository: Arc<R>, config: ConfigService, clock: Arc<C>) -> Self {
        Self {
            repository,
            config,
            clock,
        }
    }

    /// Returns the configured retry cap.
    ///
    /// # Errors
    ///
    /// Returns [`RetryControllerError::Configuration`] when configuration
    /// cannot be read.
    pub async fn max_retries(&self) -> RetryControllerResult<u32> {
        Ok(settings::max_retries(&self.config).await?)
    }

    /// Marks a processing task failed and appends its failure log entry in
    /// one store call.
    ///
    /// The attempt number is the recorded failure count plus one.
    ///
    /// # Errors
    ///
    /// Returns [`RetryControllerError`] when the task is not processing or
    /// the store rejects the record.
    #[instrument(
        skip(self, task, error),
        fields(task_id = %task.id(), employee_number = %task.employee_number(), account_type = %task.account_type())
    )]
    pub async fn record_failure(
        &self,
        task: &mut ProvisioningTask,
        error: &ProvisioningError,
        department_code: Option<&str>,
        max_retries: u32,
    ) -> RetryControllerResult<FailureOutcome> {
        let recorded = self.repository.failure_count(task.id()).await?;
        let attempt = AttemptNumber::after(recorded);
        let context = ExecutionContext {
            employee_number: task.employee_number().clone(),
            account_type: task.account_type(),
            department_code: department_code.map(str::to_owned),
            execution_attempt: attempt,
            processed_at: self.clock.utc(),
        };

        task.mark_failed(&*self.clock)?;
        let log = TaskExecutionLog::new(
            task.id(),
            error.to_string(),
            error.detail(),
            context,
            &*self.clock,
        );
        self.repository.record_failure(task, &log).await?;

        let outcome = FailureOutcome {
            attempt,
            max_retries,
            will_retry: should_retry(attempt.value(), max_retries),
        };
        warn!(
            attempt = attempt.value(),
            max_retries,
            will_retry = outcome.will_retry,
            error = %error,
            "provisioning attempt failed"
        );
        Ok(outcome)
    }
}
