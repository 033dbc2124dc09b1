//! Task creation against already provisioned state.

use crate::in_memory::helpers::{Platform, number, platform};
use accountsync::identity::{
    domain::{AccountType, Person},
    ports::PersonRepository,
    services::AccountBackfillService,
};
use accountsync::provisioning::services::CreationOptions;
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provisioned_person_gets_no_new_tasks(platform: Platform) {
    platform.add_person("E001", "张三").await;
    platform.map_department().await;
    let creator = platform.creator();
    creator
        .create_pending_tasks(CreationOptions::default())
        .await
        .expect("first pass");
    platform
        .processor()
        .process_batch(10)
        .await
        .expect("batch run");

    let second = creator
        .create_pending_tasks(CreationOptions::default())
        .await
        .expect("second pass");

    assert_eq!(second.persons_examined, 1);
    assert_eq!(second.tasks_created, 0);
    assert!(second.planned.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn departed_person_is_not_examined(platform: Platform) {
    platform.add_person("E001", "张三").await;
    let departed = Person::new(number("E009"), "王五", "10", "3").expect("valid person");
    platform
        .identity
        .upsert(&departed)
        .await
        .expect("store person");

    let report = platform
        .creator()
        .create_pending_tasks(CreationOptions::default())
        .await
        .expect("creation pass");

    assert_eq!(report.persons_examined, 1);
    assert!(
        report
            .planned
            .iter()
            .all(|planned| planned.employee_number == number("E001"))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn backfill_only_fills_types_not_provisioned() {
    let platform = Platform::with_settings(&[("enabled_account_types", r#"["mail"]"#)]);
    platform.add_person("E001", "张三").await;
    platform
        .creator()
        .create_pending_tasks(CreationOptions::default())
        .await
        .expect("creation pass");
    platform
        .processor()
        .process_batch(10)
        .await
        .expect("batch run");
    let backfill = AccountBackfillService::new(
        Arc::clone(&platform.identity),
        Arc::clone(&platform.identity),
        Arc::new(DefaultClock),
    );

    let report = backfill.backfill(false).await.expect("backfill");

    let mut filled: Vec<AccountType> = report
        .missing
        .iter()
        .map(|missing| missing.account_type)
        .collect();
    filled.sort_by_key(|account_type| account_type.as_str());
    assert_eq!(filled, vec![AccountType::Chat, AccountType::Directory]);
    assert_eq!(
        platform
            .account_identifier("E001", AccountType::Mail)
            .await
            .as_deref(),
        Some("zhangsan@example.com")
    );
}
