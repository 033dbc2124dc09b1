//! When steps for task retry BDD scenarios.

use super::world::{TaskRetryWorld, account_type, run_async};
use accountsync::provisioning::services::RetryNowOutcome;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("the batch runs {runs:u32} times")]
fn batch_runs(world: &mut TaskRetryWorld, runs: u32) -> Result<(), eyre::Report> {
    let processor = world.processor();
    for _ in 0..runs {
        let report = run_async(processor.process_batch(10)).wrap_err("run batch")?;
        world.last_report = Some(report);
    }
    Ok(())
}

#[when(r#"the "{kind}" provider recovers"#)]
fn provider_recovers(world: &mut TaskRetryWorld, kind: String) -> Result<(), eyre::Report> {
    world.provisioner.set_failing(account_type(&kind)?, false);
    Ok(())
}

#[when(r#"an operator retries the "{kind}" task"#)]
fn operator_retries(world: &mut TaskRetryWorld, kind: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(account_type(&kind)?)?;
    let entries = run_async(world.admin().retry_now(&[task_id])).wrap_err("manual retry")?;
    let ran = entries
        .iter()
        .all(|entry| matches!(entry.outcome, RetryNowOutcome::Ran(_)));
    if !ran {
        return Err(eyre::eyre!("manual retry did not run: {entries:?}"));
    }
    Ok(())
}
