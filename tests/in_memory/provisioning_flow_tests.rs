//! End-to-end creation and batch runs over in-memory stores.

use crate::in_memory::helpers::{
    CHAT_CREATE, DIRECTORY_ONBOARDING, DIRECTORY_TOKEN, MAIL_ENABLE, Platform, platform,
};
use accountsync::identity::domain::AccountType;
use accountsync::provisioning::{
    domain::{TaskId, TaskStatus},
    ports::TaskRepository,
    services::{BatchReport, CreationOptions},
};
use rstest::rstest;
use serde_json::json;

async fn create_tasks(platform: &Platform) -> Vec<TaskId> {
    platform
        .creator()
        .create_pending_tasks(CreationOptions::default())
        .await
        .expect("task creation")
        .planned
        .into_iter()
        .map(|planned| planned.task_id)
        .collect()
}

async fn status_of(platform: &Platform, id: TaskId) -> TaskStatus {
    platform
        .tasks
        .find_by_id(id)
        .await
        .expect("task lookup")
        .expect("task exists")
        .status()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn new_hire_gets_every_account_in_one_batch(platform: Platform) {
    platform.add_person("E001", "张三").await;
    platform.map_department().await;
    assert_eq!(create_tasks(&platform).await.len(), 3);

    let report = platform
        .processor()
        .process_batch(10)
        .await
        .expect("batch run");

    assert_eq!(
        report,
        BatchReport {
            processed: 3,
            succeeded: 3,
            ..BatchReport::default()
        }
    );
    assert_eq!(
        platform
            .account_identifier("E001", AccountType::Directory)
            .await
            .as_deref(),
        Some("zsE001")
    );
    assert_eq!(
        platform
            .account_identifier("E001", AccountType::Chat)
            .await
            .as_deref(),
        Some("E001")
    );
    assert_eq!(
        platform
            .account_identifier("E001", AccountType::Mail)
            .await
            .as_deref(),
        Some("zhangsan@example.com")
    );
    assert_eq!(
        platform.transport.bodies_sent_to(MAIL_ENABLE),
        vec![json!({"EnableMailboxList": [{"SAMAccountName": "zsE001", "Alias": "zhangsan"}]})]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn exchanged_token_is_reused_across_persons() {
    let platform = Platform::with_settings(&[("enabled_account_types", r#"["directory"]"#)]);
    platform.add_person("E001", "张三").await;
    platform.add_person("E002", "李四").await;
    platform.map_department().await;
    create_tasks(&platform).await;

    let report = platform
        .processor()
        .process_batch(10)
        .await
        .expect("batch run");

    assert_eq!(report.succeeded, 2);
    assert_eq!(platform.transport.bodies_sent_to(DIRECTORY_TOKEN).len(), 1);
    assert_eq!(
        platform.transport.bodies_sent_to(DIRECTORY_ONBOARDING).len(),
        2
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn task_stops_being_picked_up_at_the_retry_cap() {
    let platform = Platform::with_settings(&[
        ("enabled_account_types", r#"["chat"]"#),
        ("account_creation_max_retries", "2"),
    ]);
    platform.add_person("E001", "张三").await;
    platform.transport.fail(CHAT_CREATE);
    let ids = create_tasks(&platform).await;
    let [task_id] = ids.as_slice() else {
        panic!("expected one task, got {ids:?}");
    };
    let processor = platform.processor();

    for _ in 0..2 {
        let report = processor.process_batch(10).await.expect("batch run");
        assert_eq!((report.processed, report.failed), (1, 1));
    }
    let third = processor.process_batch(10).await.expect("batch run");

    assert_eq!(third, BatchReport::default());
    assert_eq!(status_of(&platform, *task_id).await, TaskStatus::Failed);
    let logs = platform
        .tasks
        .execution_logs(*task_id)
        .await
        .expect("failure history");
    let attempts: Vec<u32> = logs.iter().map(|log| log.attempt().value()).collect();
    assert_eq!(attempts, vec![1, 2]);
    assert_eq!(platform.transport.bodies_sent_to(CHAT_CREATE).len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn mail_waits_until_directory_succeeds() {
    let platform = Platform::with_settings(&[("enabled_account_types", r#"["directory","mail"]"#)]);
    platform.add_person("E002", "李四").await;
    platform.map_department().await;
    platform.transport.fail(DIRECTORY_ONBOARDING);
    let ids = create_tasks(&platform).await;
    let [directory_id, mail_id] = ids.as_slice() else {
        panic!("expected two tasks, got {ids:?}");
    };
    let processor = platform.processor();

    let first = processor.process_batch(10).await.expect("first batch");

    assert_eq!(
        first,
        BatchReport {
            processed: 1,
            failed: 1,
            skipped: 1,
            ..BatchReport::default()
        }
    );
    assert_eq!(status_of(&platform, *mail_id).await, TaskStatus::Pending);
    assert!(platform.transport.bodies_sent_to(MAIL_ENABLE).is_empty());

    platform.transport.recover(DIRECTORY_ONBOARDING);
    let second = processor.process_batch(10).await.expect("second batch");

    assert_eq!(second.succeeded, 2);
    assert_eq!(status_of(&platform, *directory_id).await, TaskStatus::Completed);
    assert_eq!(status_of(&platform, *mail_id).await, TaskStatus::Completed);
}

#[tokio::test(flavor = "multi_thread")]
async fn unmapped_department_is_logged_with_its_code() {
    let platform = Platform::with_settings(&[("enabled_account_types", r#"["directory"]"#)]);
    platform.add_person("E001", "张三").await;
    let ids = create_tasks(&platform).await;
    let [task_id] = ids.as_slice() else {
        panic!("expected one task, got {ids:?}");
    };

    let report = platform
        .processor()
        .process_batch(10)
        .await
        .expect("batch run");

    assert_eq!(report.failed, 1);
    assert!(platform.transport.bodies_sent_to(DIRECTORY_ONBOARDING).is_empty());
    let logs = platform
        .tasks
        .execution_logs(*task_id)
        .await
        .expect("failure history");
    let log = logs.first().expect("one failure logged");
    assert_eq!(log.error_details()["kind"], "mapping_missing");
    assert_eq!(log.error_details()["department_code"], "D10");
    assert_eq!(
        log.execution_context().department_code.as_deref(),
        Some("D10")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_provider_setting_aborts_before_any_task_runs() {
    let platform = Platform::with_settings(&[("mail_auth_token", "")]);
    platform.add_person("E001", "张三").await;
    platform.map_department().await;
    let ids = create_tasks(&platform).await;

    let result = platform.processor().process_batch(10).await;

    assert!(result.is_err(), "expected preflight failure, got {result:?}");
    for id in ids {
        assert_eq!(status_of(&platform, id).await, TaskStatus::Pending);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn replacement_task_runs_ahead_of_the_failed_one_it_replaced() {
    let platform = Platform::with_settings(&[("enabled_account_types", r#"["directory"]"#)]);
    platform.add_person("E001", "张三").await;
    platform.map_department().await;
    platform.transport.fail(DIRECTORY_ONBOARDING);
    let first_ids = create_tasks(&platform).await;
    let [failed_id] = first_ids.as_slice() else {
        panic!("expected one task, got {first_ids:?}");
    };
    let processor = platform.processor();
    let first = processor.process_batch(1).await.expect("first batch");
    assert_eq!((first.processed, first.failed), (1, 1));

    let second_ids = create_tasks(&platform).await;
    let [replacement_id] = second_ids.as_slice() else {
        panic!("expected one replacement task, got {second_ids:?}");
    };
    platform.transport.recover(DIRECTORY_ONBOARDING);
    let second = processor.process_batch(1).await.expect("second batch");

    assert_eq!(
        second,
        BatchReport {
            processed: 1,
            succeeded: 1,
            ..BatchReport::default()
        }
    );
    assert_eq!(
        status_of(&platform, *replacement_id).await,
        TaskStatus::Completed
    );
    assert_eq!(status_of(&platform, *failed_id).await, TaskStatus::Failed);
    assert_eq!(
        platform
            .account_identifier("E001", AccountType::Directory)
            .await
            .as_deref(),
        Some("zsE001")
    );
    assert_eq!(
        processor.process_batch(1).await.expect("idle batch"),
        BatchReport::default()
    );
}
