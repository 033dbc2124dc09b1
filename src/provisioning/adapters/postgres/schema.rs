//! Diesel schema for provisioning task persistence.

diesel::table! {
    /// Provisioning tasks, one active row per person and account type.
    provisioning_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Insertion sequence used to break creation-time ties.
        seq -> Int8,
        /// Owning person's employee number.
        #[max_length = 64]
        employee_number -> Varchar,
        /// Account type to provision.
        #[max_length = 20]
        account_type -> Varchar,
        /// Task status.
        #[max_length = 20]
        status -> Varchar,
        /// Task this one waits for.
        depends_on -> Nullable<Uuid>,
        /// Success payload of a completed task.
        result -> Nullable<Jsonb>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only failure history, one row per failed attempt.
    task_execution_logs (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// One-based attempt number, unique per task.
        attempt -> Int4,
        /// Error message.
        error_message -> Text,
        /// Structured error detail.
        error_details -> Jsonb,
        /// Execution context snapshot.
        execution_context -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(task_execution_logs -> provisioning_tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(provisioning_tasks, task_execution_logs);
