//! Diesel row models for provisioning persistence.

use super::schema::{provisioning_tasks, task_execution_logs};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for provisioning tasks.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = provisioning_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: uuid::Uuid,
    /// Insertion sequence.
    #[diesel(sql_type = diesel::sql_types::Int8)]
    pub seq: i64,
    /// Owning person.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub employee_number: String,
    /// Account type.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub account_type: String,
    /// Task status.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub status: String,
    /// Dependency reference.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Uuid>)]
    pub depends_on: Option<uuid::Uuid>,
    /// Success payload.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Jsonb>)]
    pub result: Option<Value>,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Timestamptz>)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert model for provisioning tasks. `seq` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = provisioning_tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning person.
    pub employee_number: String,
    /// Account type.
    pub account_type: String,
    /// Task status.
    pub status: String,
    /// Dependency reference.
    pub depends_on: Option<uuid::Uuid>,
    /// Success payload.
    pub result: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Changeset applied when a task's lifecycle fields move.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = provisioning_tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    /// Task status.
    pub status: String,
    /// Success payload.
    pub result: Option<Value>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Candidate query row: a task plus its failure count.
#[derive(Debug, Clone, QueryableByName)]
pub struct CandidateRow {
    /// Task columns.
    #[diesel(embed)]
    pub task: TaskRow,
    /// Number of failure log entries.
    #[diesel(sql_type = diesel::sql_types::Int8)]
    pub retry_count: i64,
}

/// Query result row for failure log entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_execution_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LogRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Attempt number.
    pub attempt: i32,
    /// Error message.
    pub error_message: String,
    /// Structured error detail.
    pub error_details: Value,
    /// Execution context snapshot.
    pub execution_context: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for failure log entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_execution_logs)]
pub struct NewLogRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Attempt number.
    pub attempt: i32,
    /// Error message.
    pub error_message: String,
    /// Structured error detail.
    pub error_details: Value,
    /// Execution context snapshot.
    pub execution_context: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
