//! `PostgreSQL` repository implementation for provisioning task storage.

use super::{
    models::{CandidateRow, LogRow, NewLogRow, NewTaskRow, TaskChangeset, TaskRow},
    schema::{provisioning_tasks, task_execution_logs},
};
use crate::identity::domain::{AccountType, EmployeeNumber};
use crate::provisioning::{
    domain::{
        AttemptNumber, ExecutionContext, PersistedLogData, PersistedTaskData, ProvisioningResult,
        ProvisioningTask, TaskExecutionLog, TaskId, TaskStatus,
    },
    ports::{TaskCandidate, TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by provisioning adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

const ACTIVE_TASK_INDEX: &str = "idx_provisioning_tasks_active_unique";

/// `PostgreSQL`-backed provisioning task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &ProvisioningTask) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let employee_number = task.employee_number().clone();
        let account_type = task.account_type();
        let new_row = to_new_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(provisioning_tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_active_task_violation(info.as_ref()) =>
                    {
                        TaskRepositoryError::DuplicateActiveTask {
                            employee_number: employee_number.clone(),
                            account_type,
                        }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &ProvisioningTask) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let employee_number = task.employee_number().clone();
        let account_type = task.account_type();
        let changeset = to_changeset(task)?;

        self.run_blocking(move |connection| {
            let updated = apply_changeset(connection, task_id, &changeset).map_err(|err| {
                active_violation_or(err, &employee_number, account_type)
            })?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<ProvisioningTask>> {
        self.run_blocking(move |connection| {
            let row = provisioning_tasks::table
                .filter(provisioning_tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_active(
        &self,
        employee_number: &EmployeeNumber,
        account_type: AccountType,
    ) -> TaskRepositoryResult<Option<ProvisioningTask>> {
        let lookup = employee_number.as_str().to_owned();
        self.run_blocking(move |connection| {
            let active: Vec<&str> = TaskStatus::ALL
                .into_iter()
                .filter(|status| status.is_active())
                .map(TaskStatus::as_str)
                .collect();
            let row = provisioning_tasks::table
                .filter(provisioning_tasks::employee_number.eq(lookup))
                .filter(provisioning_tasks::account_type.eq(account_type.as_str()))
                .filter(provisioning_tasks::status.eq_any(active))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_candidates(
        &self,
        max_retries: u32,
        limit: usize,
    ) -> TaskRepositoryResult<Vec<TaskCandidate>> {
        let limit = i64::try_from(limit).map_err(TaskRepositoryError::persistence)?;
        self.run_blocking(move |connection| {
            let rows = diesel::sql_query(concat!(
                "SELECT t.id, t.seq, t.employee_number, t.account_type, t.status, ",
                "t.depends_on, t.result, t.created_at, t.updated_at, t.completed_at, ",
                "COALESCE(l.failures, 0) AS retry_count ",
                "FROM provisioning_tasks t ",
                "LEFT JOIN (SELECT task_id, COUNT(*) AS failures ",
                "FROM task_execution_logs GROUP BY task_id) l ON l.task_id = t.id ",
                "WHERE (t.status = 'pending' ",
                "OR (t.status = 'failed' AND COALESCE(l.failures, 0) < $1 ",
                "AND NOT EXISTS (SELECT 1 FROM provisioning_tasks a ",
                "WHERE a.employee_number = t.employee_number ",
                "AND a.account_type = t.account_type AND a.id <> t.id ",
                "AND a.status IN ('pending', 'processing', 'completed')))) ",
                "ORDER BY t.created_at, t.seq ",
                "LIMIT $2",
            ))
            .bind::<diesel::sql_types::BigInt, _>(i64::from(max_retries))
            .bind::<diesel::sql_types::BigInt, _>(limit)
            .load::<CandidateRow>(connection)?;

            rows.into_iter()
                .map(|row| {
                    let retry_count =
                        u32::try_from(row.retry_count).map_err(TaskRepositoryError::persistence)?;
                    Ok(TaskCandidate {
                        task: row_to_task(row.task)?,
                        retry_count,
                    })
                })
                .collect()
        })
        .await
    }

    async fn record_failure(
        &self,
        task: &ProvisioningTask,
        log: &TaskExecutionLog,
    ) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let employee_number = task.employee_number().clone();
        let account_type = task.account_type();
        let changeset = to_changeset(task)?;
        let new_log = to_new_log_row(log)?;
        let actual = log.attempt();

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let recorded = count_failures(tx, task_id)?;
                let expected = AttemptNumber::after(recorded);
                if expected != actual {
                    return Err(TaskRepositoryError::AttemptConflict {
                        task_id,
                        expected,
                        actual,
                    });
                }
                diesel::insert_into(task_execution_logs::table)
                    .values(&new_log)
                    .execute(tx)?;
                let updated = apply_changeset(tx, task_id, &changeset)
                    .map_err(|err| active_violation_or(err, &employee_number, account_type))?;
                if updated == 0 {
                    return Err(TaskRepositoryError::NotFound(task_id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn execution_logs(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskExecutionLog>> {
        self.run_blocking(move |connection| {
            let rows = task_execution_logs::table
                .filter(task_execution_logs::task_id.eq(id.into_inner()))
                .order(task_execution_logs::attempt.asc())
                .select(LogRow::as_select())
                .load::<LogRow>(connection)?;
            rows.into_iter().map(row_to_log).collect()
        })
        .await
    }

    async fn failure_count(&self, id: TaskId) -> TaskRepositoryResult<u32> {
        self.run_blocking(move |connection| count_failures(connection, id))
            .await
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<ProvisioningTask>> {
        let filter = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = provisioning_tasks::table
                .select(TaskRow::as_select())
                .order((
                    provisioning_tasks::created_at.desc(),
                    provisioning_tasks::seq.desc(),
                ))
                .into_boxed();
            if let Some(status) = filter.status {
                query = query.filter(provisioning_tasks::status.eq(status.as_str()));
            }
            if let Some(account_type) = filter.account_type {
                query = query.filter(provisioning_tasks::account_type.eq(account_type.as_str()));
            }
            if let Some(number) = filter.employee_number {
                query = query.filter(
                    provisioning_tasks::employee_number.eq(number.as_str().to_owned()),
                );
            }
            let rows = query.load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

fn apply_changeset(
    connection: &mut PgConnection,
    task_id: TaskId,
    changeset: &TaskChangeset,
) -> Result<usize, DieselError> {
    diesel::update(provisioning_tasks::table.filter(provisioning_tasks::id.eq(task_id.into_inner())))
        .set(changeset)
        .execute(connection)
}

fn count_failures(connection: &mut PgConnection, task_id: TaskId) -> TaskRepositoryResult<u32> {
    let count: i64 = task_execution_logs::table
        .filter(task_execution_logs::task_id.eq(task_id.into_inner()))
        .count()
        .get_result(connection)?;
    u32::try_from(count).map_err(TaskRepositoryError::persistence)
}

fn active_violation_or(
    err: DieselError,
    employee_number: &EmployeeNumber,
    account_type: AccountType,
) -> TaskRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if is_active_task_violation(info.as_ref()) =>
        {
            TaskRepositoryError::DuplicateActiveTask {
                employee_number: employee_number.clone(),
                account_type,
            }
        }
        _ => TaskRepositoryError::persistence(err),
    }
}

fn is_active_task_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == ACTIVE_TASK_INDEX)
}

fn to_new_row(task: &ProvisioningTask) -> TaskRepositoryResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        employee_number: task.employee_number().as_str().to_owned(),
        account_type: task.account_type().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        depends_on: task.depends_on().map(TaskId::into_inner),
        result: result_to_value(task.result())?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        completed_at: task.completed_at(),
    })
}

fn to_changeset(task: &ProvisioningTask) -> TaskRepositoryResult<TaskChangeset> {
    Ok(TaskChangeset {
        status: task.status().as_str().to_owned(),
        result: result_to_value(task.result())?,
        updated_at: task.updated_at(),
        completed_at: task.completed_at(),
    })
}

fn result_to_value(
    result: Option<&ProvisioningResult>,
) -> TaskRepositoryResult<Option<serde_json::Value>> {
    result
        .map(serde_json::to_value)
        .transpose()
        .map_err(TaskRepositoryError::persistence)
}

fn to_new_log_row(log: &TaskExecutionLog) -> TaskRepositoryResult<NewLogRow> {
    let attempt = i32::try_from(log.attempt().value()).map_err(TaskRepositoryError::persistence)?;
    let execution_context =
        serde_json::to_value(log.execution_context()).map_err(TaskRepositoryError::persistence)?;
    Ok(NewLogRow {
        id: log.id(),
        task_id: log.task_id().into_inner(),
        attempt,
        error_message: log.error_message().to_owned(),
        error_details: log.error_details().clone(),
        execution_context,
        created_at: log.created_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<ProvisioningTask> {
    let TaskRow {
        id,
        seq: _,
        employee_number,
        account_type,
        status,
        depends_on,
        result,
        created_at,
        updated_at,
        completed_at,
    } = row;

    let employee_number =
        EmployeeNumber::new(employee_number).map_err(TaskRepositoryError::persistence)?;
    let account_type =
        AccountType::try_from(account_type.as_str()).map_err(TaskRepositoryError::persistence)?;
    let status = TaskStatus::try_from(status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let result = result
        .map(serde_json::from_value::<ProvisioningResult>)
        .transpose()
        .map_err(TaskRepositoryError::persistence)?;

    Ok(ProvisioningTask::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        employee_number,
        account_type,
        status,
        depends_on: depends_on.map(TaskId::from_uuid),
        result,
        created_at,
        updated_at,
        completed_at,
    }))
}

fn row_to_log(row: LogRow) -> TaskRepositoryResult<TaskExecutionLog> {
    let attempt = u32::try_from(row.attempt)
        .map_err(TaskRepositoryError::persistence)
        .and_then(|value| AttemptNumber::new(value).map_err(TaskRepositoryError::persistence))?;
    let execution_context = serde_json::from_value::<ExecutionContext>(row.execution_context)
        .map_err(TaskRepositoryError::persistence)?;
    Ok(TaskExecutionLog::from_persisted(PersistedLogData {
        id: row.id,
        task_id: TaskId::from_uuid(row.task_id),
        attempt,
        error_message: row.error_message,
        error_details: row.error_details,
        execution_context,
        created_at: row.created_at,
    }))
}
