//! Given steps for task retry BDD scenarios.

use super::world::{TaskRetryWorld, account_type, run_async};
use accountsync::config::{ConfigEntry, keys, ports::ConfigStore};
use accountsync::identity::{
    domain::{DepartmentInfo, EmployeeNumber, Person},
    ports::PersonRepository,
};
use accountsync::provisioning::{domain::ProvisioningTask, ports::TaskRepository};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest_bdd_macros::given;

#[given("the retry cap is {cap:u32}")]
fn retry_cap(world: &mut TaskRetryWorld, cap: u32) -> Result<(), eyre::Report> {
    run_async(
        world
            .settings
            .set(ConfigEntry::new(keys::MAX_RETRIES, cap.to_string())),
    )
    .wrap_err("store retry cap")
}

#[given(r#"employee "{employee_number}" needs a "{kind}" account"#)]
fn employee_needs_account(
    world: &mut TaskRetryWorld,
    employee_number: String,
    kind: String,
) -> Result<(), eyre::Report> {
    let number = EmployeeNumber::new(employee_number)
        .map_err(|err| eyre::eyre!("invalid employee number: {err}"))?;
    let person = Person::new(number.clone(), "张三", "10", "1")
        .map_err(|err| eyre::eyre!("invalid person: {err}"))?
        .with_department(DepartmentInfo::with_code("D10"));
    run_async(world.identity.upsert(&person)).wrap_err("store person")?;

    let account_type = account_type(&kind)?;
    let depends_on = account_type
        .prerequisite()
        .and_then(|prerequisite| world.task_ids.get(&prerequisite).copied());
    let task = ProvisioningTask::new(number, account_type, depends_on, &DefaultClock);
    run_async(world.tasks.store(&task)).wrap_err("store task")?;
    world.task_ids.insert(account_type, task.id());
    Ok(())
}

#[given(r#"the "{kind}" provider is failing"#)]
fn provider_failing(world: &mut TaskRetryWorld, kind: String) -> Result<(), eyre::Report> {
    world.provisioner.set_failing(account_type(&kind)?, true);
    Ok(())
}
