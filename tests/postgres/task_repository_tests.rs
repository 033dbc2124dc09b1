//! Task repository behaviour against a real `PostgreSQL` schema.

use crate::postgres::helpers::TestSchema;
use accountsync::identity::domain::{AccountType, EmployeeNumber};
use accountsync::provisioning::{
    adapters::postgres::PostgresTaskRepository,
    domain::{
        AttemptNumber, ExecutionContext, ProvisioningResult, ProvisioningTask, TaskExecutionLog,
        TaskStatus,
    },
    ports::{TaskFilter, TaskRepository, TaskRepositoryError},
};
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn schema() -> Option<TestSchema> {
    TestSchema::create().expect("test schema setup")
}

fn number(value: &str) -> EmployeeNumber {
    EmployeeNumber::new(value).expect("valid employee number")
}

fn task(employee_number: &str, account_type: AccountType) -> ProvisioningTask {
    ProvisioningTask::new(number(employee_number), account_type, None, &DefaultClock)
}

fn failure_log(task: &ProvisioningTask, attempt: AttemptNumber) -> TaskExecutionLog {
    let context = ExecutionContext {
        employee_number: task.employee_number().clone(),
        account_type: task.account_type(),
        department_code: Some("D10".to_owned()),
        execution_attempt: attempt,
        processed_at: DefaultClock.utc(),
    };
    TaskExecutionLog::new(
        task.id(),
        "chat provision rejected (HTTP 500): service unavailable",
        json!({"kind": "rejected", "status": 500}),
        context,
        &DefaultClock,
    )
}

async fn fail(repo: &PostgresTaskRepository, task: &mut ProvisioningTask) {
    let attempt = AttemptNumber::after(repo.failure_count(task.id()).await.expect("count"));
    task.mark_processing(&DefaultClock).expect("claim");
    repo.update(task).await.expect("store claim");
    task.mark_failed(&DefaultClock).expect("fail");
    repo.record_failure(task, &failure_log(task, attempt))
        .await
        .expect("record failure");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_index_rejects_second_active_task(schema: Option<TestSchema>) {
    let Some(schema) = schema else { return };
    let repo = &schema.repo;
    let mut first = task("E001", AccountType::Chat);
    repo.store(&first).await.expect("store");

    let duplicate = repo.store(&task("E001", AccountType::Chat)).await;
    assert!(
        matches!(
            duplicate,
            Err(TaskRepositoryError::DuplicateActiveTask {
                account_type: AccountType::Chat,
                ..
            })
        ),
        "expected DuplicateActiveTask, got {duplicate:?}"
    );

    fail(repo, &mut first).await;
    repo.store(&task("E001", AccountType::Chat))
        .await
        .expect("failed task does not block a replacement");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reviving_a_replaced_task_is_rejected(schema: Option<TestSchema>) {
    let Some(schema) = schema else { return };
    let repo = &schema.repo;
    let mut stale = task("E001", AccountType::Mail);
    repo.store(&stale).await.expect("store");
    fail(repo, &mut stale).await;
    repo.store(&task("E001", AccountType::Mail))
        .await
        .expect("replacement");

    stale.mark_processing(&DefaultClock).expect("claim");
    let result = repo.update(&stale).await;

    assert!(matches!(
        result,
        Err(TaskRepositoryError::DuplicateActiveTask { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn candidates_respect_retry_cap_and_order(schema: Option<TestSchema>) {
    let Some(schema) = schema else { return };
    let repo = &schema.repo;
    let pending = task("E001", AccountType::Directory);
    let mut exhausted = task("E002", AccountType::Directory);
    let mut retryable = task("E003", AccountType::Directory);
    let mut done = task("E004", AccountType::Directory);
    for item in [&pending, &exhausted, &retryable, &done] {
        repo.store(item).await.expect("store");
    }
    fail(repo, &mut exhausted).await;
    fail(repo, &mut exhausted).await;
    fail(repo, &mut retryable).await;
    done.mark_processing(&DefaultClock).expect("claim");
    done.mark_completed(ProvisioningResult::new("zsE004"), &DefaultClock)
        .expect("complete");
    repo.update(&done).await.expect("update");

    let candidates = repo.find_candidates(2, 10).await.expect("candidates");

    assert_eq!(
        candidates.iter().map(|c| c.task.id()).collect::<Vec<_>>(),
        vec![pending.id(), retryable.id()]
    );
    assert_eq!(
        candidates.iter().map(|c| c.retry_count).collect::<Vec<_>>(),
        vec![0, 1]
    );
    let limited = repo.find_candidates(2, 1).await.expect("candidates");
    assert_eq!(limited.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replaced_failed_task_is_not_a_candidate(schema: Option<TestSchema>) {
    let Some(schema) = schema else { return };
    let repo = &schema.repo;
    let mut first = task("E001", AccountType::Mail);
    repo.store(&first).await.expect("store");
    fail(repo, &mut first).await;
    let replacement = task("E001", AccountType::Mail);
    repo.store(&replacement).await.expect("store replacement");

    let candidates = repo.find_candidates(3, 10).await.expect("candidates");

    assert_eq!(
        candidates.iter().map(|c| c.task.id()).collect::<Vec<_>>(),
        vec![replacement.id()]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failure_history_round_trips_and_conflicts_roll_back(schema: Option<TestSchema>) {
    let Some(schema) = schema else { return };
    let repo = &schema.repo;
    let mut subject = task("E001", AccountType::Chat);
    repo.store(&subject).await.expect("store");
    fail(repo, &mut subject).await;

    subject.mark_processing(&DefaultClock).expect("claim");
    repo.update(&subject).await.expect("store claim");
    subject.mark_failed(&DefaultClock).expect("fail");
    let repeated = repo
        .record_failure(&subject, &failure_log(&subject, AttemptNumber::FIRST))
        .await;

    assert!(matches!(
        repeated,
        Err(TaskRepositoryError::AttemptConflict { .. })
    ));
    let stored = repo
        .find_by_id(subject.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Processing);
    let logs = repo.execution_logs(subject.id()).await.expect("logs");
    assert_eq!(logs.len(), 1);
    let log = logs.first().expect("one entry");
    assert_eq!(log.attempt(), AttemptNumber::FIRST);
    assert_eq!(log.error_details()["status"], 500);
    assert_eq!(
        log.execution_context().department_code.as_deref(),
        Some("D10")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_filters_by_status(schema: Option<TestSchema>) {
    let Some(schema) = schema else { return };
    let repo = &schema.repo;
    let mut failed = task("E001", AccountType::Chat);
    let pending = task("E002", AccountType::Chat);
    repo.store(&failed).await.expect("store");
    repo.store(&pending).await.expect("store");
    fail(repo, &mut failed).await;

    let listed = repo
        .list(&TaskFilter {
            status: Some(TaskStatus::Failed),
            ..TaskFilter::default()
        })
        .await
        .expect("list");

    assert_eq!(
        listed.iter().map(ProvisioningTask::id).collect::<Vec<_>>(),
        vec![failed.id()]
    );
}
