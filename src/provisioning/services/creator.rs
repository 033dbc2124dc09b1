//! Task creator: turns eligible persons into pending provisioning tasks.

use super::settings;
use crate::config::{ConfigError, ConfigService, keys};
use crate::identity::domain::{AccountType, EmployeeNumber, Person};
use crate::identity::ports::{IdentityStoreError, PersonRepository};
use crate::provisioning::{
    domain::{ProvisioningTask, TaskId},
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Options for a creation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationOptions {
    /// Report the tasks that would be created without writing them.
    pub dry_run: bool,
    /// Employment statuses to use instead of the configured list.
    pub statuses: Option<Vec<String>>,
}

/// A task created, or planned on a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    /// Identifier of the new task.
    pub task_id: TaskId,
    /// Owning person.
    pub employee_number: EmployeeNumber,
    /// Account type to provision.
    pub account_type: AccountType,
    /// Task the new one waits for.
    pub depends_on: Option<TaskId>,
}

/// A person whose tasks could not be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonFailure {
    /// Affected person.
    pub employee_number: EmployeeNumber,
    /// Error message.
    pub message: String,
}

/// Summary of a creation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationReport {
    /// Eligible persons looked at.
    pub persons_examined: usize,
    /// Persons skipped for lack of a department code.
    pub persons_skipped: usize,
    /// Tasks written; zero on a dry run.
    pub tasks_created: usize,
    /// Tasks created or, on a dry run, that would be created.
    pub planned: Vec<PlannedTask>,
    /// Persons whose creation failed.
    pub failures: Vec<PersonFailure>,
    /// `true` when automatic creation is switched off and nothing ran.
    pub disabled: bool,
}

/// Errors that stop a creation pass.
#[derive(Debug, Error)]
pub enum TaskCreatorError {
    /// Settings could not be read.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// Eligible persons could not be listed.
    #[error(transparent)]
    Identity(#[from] IdentityStoreError),
    /// Task store failure.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Result type for task creation.
pub type TaskCreatorResult<T> = Result<T, TaskCreatorError>;

/// Creates one task per (eligible person, enabled account type) pair lacking
/// an active task.
#[derive(Clone)]
pub struct TaskCreator<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    persons: Arc<dyn PersonRepository>,
    config: ConfigService,
    clock: Arc<C>,
}

impl<R, C> TaskCreator<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a task creator.
    #[must_use]
    pub fn new(
        tasks: Arc<R>,
        persons: Arc<dyn PersonRepository>,
        config: ConfigService,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            persons,
            config,
            clock,
        }
    }

    /// Creates pending tasks for every eligible person.
    ///
    /// Account types are handled in precedence order so the mail task can
    /// depend on the directory task created or found earlier in the same
    /// pass. Re-running without changes creates nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCreatorError`] when settings or the person list cannot
    /// be read. Per-person errors land in [`CreationReport::failures`].
    #[instrument(skip(self))]
    pub async fn create_pending_tasks(
        &self,
        options: CreationOptions,
    ) -> TaskCreatorResult<CreationReport> {
        let mut report = CreationReport::default();
        if !self
            .config
            .get_bool(keys::TASK_AUTO_CREATION_ENABLED, true)
            .await?
        {
            info!("automatic task creation disabled");
            report.disabled = true;
            return Ok(report);
        }

        let statuses = match options.statuses {
            Some(statuses) => statuses,
            None => settings::valid_employee_statuses(&self.config).await?,
        };
        let account_types = settings::enabled_account_types(&self.config).await?;
        let persons = self.persons.list_eligible(&statuses).await?;
        report.persons_examined = persons.len();

        for person in &persons {
            if person.department_code().is_none() {
                warn!(employee_number = %person.employee_number(), "no department code, skipping person");
                report.persons_skipped += 1;
                continue;
            }
            match self
                .create_for_person(person, &account_types, options.dry_run)
                .await
            {
                Ok(planned) => {
                    if !options.dry_run {
                        report.tasks_created += planned.len();
                    }
                    report.planned.extend(planned);
                }
                Err(err) => {
                    warn!(
                        employee_number = %person.employee_number(),
                        error = %err,
                        "failed to create tasks for person"
                    );
                    report.failures.push(PersonFailure {
                        employee_number: person.employee_number().clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            persons = report.persons_examined,
            skipped = report.persons_skipped,
            created = report.tasks_created,
            failures = report.failures.len(),
            dry_run = options.dry_run,
            "task creation finished"
        );
        Ok(report)
    }

    async fn create_for_person(
        &self,
        person: &Person,
        account_types: &[AccountType],
        dry_run: bool,
    ) -> Result<Vec<PlannedTask>, TaskRepositoryError> {
        let employee_number = person.employee_number();
        let mut known: HashMap<AccountType, TaskId> = HashMap::new();
        let mut planned = Vec::new();

        for &account_type in account_types {
            if let Some(active) = self
                .tasks
                .find_active(employee_number, account_type)
                .await?
            {
                debug!(%employee_number, %account_type, task_id = %active.id(), "active task exists");
                known.insert(account_type, active.id());
                continue;
            }

            let depends_on = match account_type.prerequisite() {
                Some(prerequisite) => {
                    self.prerequisite_task(employee_number, prerequisite, &known)
                        .await?
                }
                None => None,
            };
            let task = ProvisioningTask::new(
                employee_number.clone(),
                account_type,
                depends_on,
                &*self.clock,
            );
            if !dry_run {
                self.tasks.store(&task).await?;
                info!(%employee_number, %account_type, task_id = %task.id(), "task created");
            }
            known.insert(account_type, task.id());
            planned.push(PlannedTask {
                task_id: task.id(),
                employee_number: employee_number.clone(),
                account_type,
                depends_on,
            });
        }
        Ok(planned)
    }

    async fn prerequisite_task(
        &self,
        employee_number: &EmployeeNumber,
        prerequisite: AccountType,
        known: &HashMap<AccountType, TaskId>,
    ) -> Result<Option<TaskId>, TaskRepositoryError> {
        if let Some(id) = known.get(&prerequisite) {
            return Ok(Some(*id));
        }
        Ok(self
            .tasks
            .find_active(employee_number, prerequisite)
            .await?
            .map(|task| task.id()))
    }
}
