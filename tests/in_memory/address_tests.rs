//! Mailbox address allocation through real batch runs.

use crate::in_memory::helpers::{MAIL_ENABLE, Platform, number};
use accountsync::identity::{
    domain::{AccountType, Person},
    ports::PersonRepository,
};
use accountsync::provisioning::services::CreationOptions;

fn mail_only() -> Platform {
    Platform::with_settings(&[("enabled_account_types", r#"["mail"]"#)])
}

async fn create_and_run(platform: &Platform) {
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
}

#[tokio::test(flavor = "multi_thread")]
async fn namesakes_get_distinct_addresses() {
    let platform = mail_only();
    platform.add_person("E001", "张三").await;
    platform.add_person("E003", "张三").await;

    create_and_run(&platform).await;

    let first = platform.account_identifier("E001", AccountType::Mail).await;
    let second = platform.account_identifier("E003", AccountType::Mail).await;
    assert_eq!(first.as_deref(), Some("zhangsan@example.com"));
    assert_eq!(second.as_deref(), Some("zhangsan2@example.com"));
}

#[tokio::test(flavor = "multi_thread")]
async fn retried_mailbox_keeps_its_first_address() {
    let platform = mail_only();
    platform.add_person("E001", "张三").await;
    platform.transport.fail(MAIL_ENABLE);
    create_and_run(&platform).await;

    platform.transport.recover(MAIL_ENABLE);
    platform
        .processor()
        .process_batch(10)
        .await
        .expect("retry batch");

    let bodies = platform.transport.bodies_sent_to(MAIL_ENABLE);
    assert_eq!(bodies.len(), 2);
    assert!(
        bodies
            .iter()
            .all(|body| body["EnableMailboxList"][0]["Alias"] == "zhangsan")
    );
    assert_eq!(
        platform
            .account_identifier("E001", AccountType::Mail)
            .await
            .as_deref(),
        Some("zhangsan@example.com")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn new_hire_skips_an_address_held_by_an_existing_employee() {
    let platform = mail_only();
    let veteran = Person::new(number("E000"), "张三", "10", "1")
        .expect("valid person")
        .with_email_address("zhangsan@example.com");
    platform.identity.upsert(&veteran).await.expect("store person");
    platform.add_person("E001", "张三").await;

    create_and_run(&platform).await;

    assert_eq!(
        platform
            .account_identifier("E001", AccountType::Mail)
            .await
            .as_deref(),
        Some("zhangsan2@example.com")
    );
    let bodies = platform.transport.bodies_sent_to(MAIL_ENABLE);
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["EnableMailboxList"][0]["Alias"], "zhangsan2");
    assert_eq!(platform.account_identifier("E000", AccountType::Mail).await, None);
}
