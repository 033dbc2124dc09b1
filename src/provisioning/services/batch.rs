//! Batch processor: runs candidate tasks through the provisioner.

use super::retry::{FailureOutcome, RetryController, RetryControllerError};
use crate::config::{ConfigError, ConfigService, keys};
use crate::identity::domain::{Account, AccountType, EmployeeNumber};
use crate::identity::ports::{AccountRepository, IdentityStoreError, PersonRepository};
use crate::provisioning::{
    domain::{DependencyState, ProvisioningResult, ProvisioningTask, TaskDomainError, TaskId},
    ports::{AccountProvisioner, ProvisioningError, TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Counts from one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Tasks that were attempted: `succeeded + failed`.
    pub processed: usize,
    /// Tasks completed in this run.
    pub succeeded: usize,
    /// Tasks whose attempt failed, including isolated store errors.
    pub failed: usize,
    /// Candidates left untouched because their dependency is unmet.
    pub skipped: usize,
    /// `true` when processing is switched off and nothing ran.
    pub disabled: bool,
}

/// Result of running a single task.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// The account was created.
    Succeeded(ProvisioningResult),
    /// The attempt failed and was recorded.
    Failed {
        /// Failure record summary.
        outcome: FailureOutcome,
        /// Why the attempt failed.
        error: ProvisioningError,
    },
    /// The dependency is unmet; the task was not touched.
    Skipped(DependencyState),
}

/// What a batch run would do with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedAction {
    /// The task would be attempted.
    Process,
    /// The task would be skipped until its dependency completes.
    WaitForDependency,
}

/// One entry of a batch preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRun {
    /// Candidate task.
    pub task_id: TaskId,
    /// Owning person.
    pub employee_number: EmployeeNumber,
    /// Account type to provision.
    pub account_type: AccountType,
    /// Failures recorded so far.
    pub retry_count: u32,
    /// What the run would do.
    pub action: PlannedAction,
}

/// Errors that stop a batch run or a single task run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A configuration problem aborted the run.
    #[error("batch aborted: {0}")]
    Fatal(#[source] ProvisioningError),
    /// Task status change was rejected.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Task store failure.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Identity store failure.
    #[error(transparent)]
    Identity(#[from] IdentityStoreError),
    /// Failure recording failed.
    #[error(transparent)]
    Retry(#[from] RetryControllerError),
    /// Run switches could not be read.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Processes runnable tasks in creation order.
#[derive(Clone)]
pub struct BatchProcessor<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    persons: Arc<dyn PersonRepository>,
    accounts: Arc<dyn AccountRepository>,
    provisioner: Arc<dyn AccountProvisioner>,
    retry: RetryController<R, C>,
    config: ConfigService,
    clock: Arc<C>,
}

impl<R, C> BatchProcessor<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a batch processor.
    #[must_use]
    pub fn new(
        tasks: Arc<R>,
        persons: Arc<dyn PersonRepository>,
        accounts: Arc<dyn AccountRepository>,
        provisioner: Arc<dyn AccountProvisioner>,
        config: ConfigService,
        clock: Arc<C>,
    ) -> Self {
        let retry = RetryController::new(Arc::clone(&tasks), config.clone(), Arc::clone(&clock));
        Self {
            tasks,
            persons,
            accounts,
            provisioner,
            retry,
            config,
            clock,
        }
    }

    /// Returns the retry controller used for failures.
    #[must_use]
    pub const fn retry_controller(&self) -> &RetryController<R, C> {
        &self.retry
    }

    /// Runs up to `max_tasks` candidates.
    ///
    /// Nothing runs when `task_processing_enabled` is false. The provisioner
    /// preflight runs before any task is touched. A single task's error is
    /// logged and counted as a failure; only configuration errors stop the
    /// run.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Fatal`] when preflight fails or an attempt hits
    /// a configuration error, and store errors raised while selecting
    /// candidates.
    #[instrument(skip(self))]
    pub async fn process_batch(&self, max_tasks: usize) -> BatchResult<BatchReport> {
        let mut report = BatchReport::default();
        if !self
            .config
            .get_bool(keys::TASK_PROCESSING_ENABLED, true)
            .await?
        {
            info!("task processing disabled");
            report.disabled = true;
            return Ok(report);
        }

        self.preflight().await?;
        let max_retries = self.retry.max_retries().await?;
        let candidates = self.tasks.find_candidates(max_retries, max_tasks).await?;

        for candidate in candidates {
            let task_id = candidate.task.id();
            match self.process_task(candidate.task, max_retries).await {
                Ok(TaskOutcome::Succeeded(_)) => report.succeeded += 1,
                Ok(TaskOutcome::Skipped(dependency)) => {
                    warn!(%task_id, ?dependency, "dependency not completed, skipping task");
                    report.skipped += 1;
                }
                Ok(TaskOutcome::Failed { error, .. }) => {
                    report.failed += 1;
                    if error.is_fatal() {
                        report.processed = report.succeeded + report.failed;
                        error!(%task_id, ?report, "configuration error, aborting batch");
                        return Err(BatchError::Fatal(error));
                    }
                }
                Err(err) => {
                    error!(%task_id, error = %err, "task processing failed unexpectedly");
                    report.failed += 1;
                }
            }
        }

        report.processed = report.succeeded + report.failed;
        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "batch finished"
        );
        Ok(report)
    }

    /// Runs the provisioner preflight.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Fatal`] when a required setting is missing.
    pub async fn preflight(&self) -> BatchResult<()> {
        self.provisioner.preflight().await.map_err(BatchError::Fatal)
    }

    /// Reports what [`process_batch`](Self::process_batch) would do, without
    /// changing state or calling providers.
    ///
    /// # Errors
    ///
    /// Returns store and configuration errors.
    pub async fn preview_batch(&self, max_tasks: usize) -> BatchResult<Vec<PlannedRun>> {
        let max_retries = self.retry.max_retries().await?;
        let candidates = self.tasks.find_candidates(max_retries, max_tasks).await?;
        let mut plan = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let dependency = self.dependency_state(&candidate.task).await?;
            let action = if candidate.task.can_process(dependency) {
                PlannedAction::Process
            } else {
                PlannedAction::WaitForDependency
            };
            plan.push(PlannedRun {
                task_id: candidate.task.id(),
                employee_number: candidate.task.employee_number().clone(),
                account_type: candidate.task.account_type(),
                retry_count: candidate.retry_count,
                action,
            });
        }
        Ok(plan)
    }

    /// Runs one task: claim, provision, then complete or record the failure.
    ///
    /// The retry cap is not checked here; `max_retries` only shapes the
    /// returned [`FailureOutcome`].
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] when the task cannot be claimed or its outcome
    /// cannot be stored. A claimed task whose outcome cannot be stored is
    /// returned to `failed` before the error is reported.
    #[instrument(
        skip(self, task),
        fields(task_id = %task.id(), employee_number = %task.employee_number(), account_type = %task.account_type())
    )]
    pub async fn process_task(
        &self,
        mut task: ProvisioningTask,
        max_retries: u32,
    ) -> BatchResult<TaskOutcome> {
        let dependency = self.dependency_state(&task).await?;
        if !task.can_process(dependency) {
            return Ok(TaskOutcome::Skipped(dependency));
        }

        task.mark_processing(&*self.clock)?;
        self.tasks.update(&task).await?;
        let claimed = task.clone();

        let (department_code, attempt) = self.attempt(&task).await;
        match attempt {
            Ok(result) => {
                if let Err(err) = self.complete(&mut task, &result).await {
                    self.release(claimed).await;
                    return Err(err);
                }
                Ok(TaskOutcome::Succeeded(result))
            }
            Err(error) => {
                match self
                    .retry
                    .record_failure(&mut task, &error, department_code.as_deref(), max_retries)
                    .await
                {
                    Ok(outcome) => Ok(TaskOutcome::Failed { outcome, error }),
                    Err(err) => {
                        self.release(claimed).await;
                        Err(err.into())
                    }
                }
            }
        }
    }

    /// Moves a claimed task out of `processing` after its outcome could not
    /// be stored, so a later batch picks it up again.
    async fn release(&self, mut claimed: ProvisioningTask) {
        if let Err(err) = claimed.mark_failed(&*self.clock) {
            warn!(error = %err, "claimed task could not be released");
            return;
        }
        match self.tasks.update(&claimed).await {
            Ok(()) => warn!("claimed task released as failed"),
            Err(err) => error!(error = %err, "claimed task left in processing"),
        }
    }

    /// Looks up the status of a task's dependency.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Repository`] when the lookup fails.
    pub async fn dependency_state(&self, task: &ProvisioningTask) -> BatchResult<DependencyState> {
        let Some(dependency_id) = task.depends_on() else {
            return Ok(DependencyState::Independent);
        };
        Ok(self
            .tasks
            .find_by_id(dependency_id)
            .await?
            .map_or(DependencyState::Missing, |dependency| {
                DependencyState::Resolved(dependency.status())
            }))
    }

    async fn attempt(
        &self,
        task: &ProvisioningTask,
    ) -> (Option<String>, Result<ProvisioningResult, ProvisioningError>) {
        let person = match self
            .persons
            .find_by_employee_number(task.employee_number())
            .await
        {
            Ok(Some(person)) => person,
            Ok(None) => {
                return (
                    None,
                    Err(ProvisioningError::PersonNotFound(
                        task.employee_number().clone(),
                    )),
                );
            }
            Err(err) => return (None, Err(err.into())),
        };
        let Some(department_code) = person.department_code().map(str::to_owned) else {
            return (
                None,
                Err(ProvisioningError::MissingDepartment(
                    task.employee_number().clone(),
                )),
            );
        };
        let result = self
            .provisioner
            .provision(&person, task.account_type(), &department_code)
            .await;
        (Some(department_code), result)
    }

    async fn complete(
        &self,
        task: &mut ProvisioningTask,
        result: &ProvisioningResult,
    ) -> BatchResult<()> {
        let mut account = self
            .accounts
            .find(task.employee_number(), task.account_type())
            .await?
            .unwrap_or_else(|| {
                Account::new(
                    task.employee_number().clone(),
                    task.account_type(),
                    &*self.clock,
                )
            });
        account.mark_created(
            Some(result.account_identifier().to_owned()),
            &*self.clock,
        );
        self.accounts.save(&account).await?;

        task.mark_completed(result.clone(), &*self.clock)?;
        self.tasks.update(task).await?;
        info!(
            account_identifier = result.account_identifier(),
            "task completed"
        );
        Ok(())
    }
}
