//! Backfills account rows for persons provisioned outside the task engine.

use crate::identity::{
    domain::{Account, AccountType, EmployeeNumber, Person},
    ports::{AccountRepository, IdentityStoreError, PersonRepository},
};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// An account row that is missing for a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingAccount {
    /// Owning person.
    pub employee_number: EmployeeNumber,
    /// Missing account type.
    pub account_type: AccountType,
    /// Identifier the HR record already carries, if any.
    pub identifier: Option<String>,
}

/// Summary of a backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Number of persons examined.
    pub persons_examined: usize,
    /// Missing rows found, in person then account-type order.
    pub missing: Vec<MissingAccount>,
    /// Rows written per account type; empty on a dry run.
    pub created: BTreeMap<AccountType, usize>,
    /// Rows that could not be written.
    pub failures: usize,
}

/// Ensures every person has one account row per account type.
#[derive(Clone)]
pub struct AccountBackfillService<P, A, C>
where
    P: PersonRepository,
    A: AccountRepository,
    C: Clock + Send + Sync,
{
    persons: Arc<P>,
    accounts: Arc<A>,
    clock: Arc<C>,
}

impl<P, A, C> AccountBackfillService<P, A, C>
where
    P: PersonRepository,
    A: AccountRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new backfill service.
    #[must_use]
    pub const fn new(persons: Arc<P>, accounts: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            persons,
            accounts,
            clock,
        }
    }

    /// Creates missing account rows, marking them as already created.
    ///
    /// New rows take the identifier the HR record carries: the email address
    /// for mail, the employee account for directory and chat. With `dry_run`
    /// the missing rows are reported but nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityStoreError`] when persons or accounts cannot be read.
    #[instrument(skip(self))]
    pub async fn backfill(&self, dry_run: bool) -> Result<BackfillReport, IdentityStoreError> {
        let persons = self.persons.list_all().await?;
        let mut report = BackfillReport {
            persons_examined: persons.len(),
            ..BackfillReport::default()
        };

        for person in &persons {
            let existing = self
                .accounts
                .list_for_person(person.employee_number())
                .await?;
            for account_type in AccountType::ALL {
                if existing
                    .iter()
                    .any(|account| account.account_type() == account_type)
                {
                    continue;
                }
                report.missing.push(MissingAccount {
                    employee_number: person.employee_number().clone(),
                    account_type,
                    identifier: hr_identifier(person, account_type),
                });
            }
        }

        if dry_run {
            return Ok(report);
        }

        for missing in &report.missing {
            let mut account = Account::new(
                missing.employee_number.clone(),
                missing.account_type,
                &*self.clock,
            );
            account.mark_created(missing.identifier.clone(), &*self.clock);
            match self.accounts.save(&account).await {
                Ok(()) => *report.created.entry(missing.account_type).or_default() += 1,
                Err(err) => {
                    warn!(
                        employee_number = %missing.employee_number,
                        account_type = %missing.account_type,
                        error = %err,
                        "failed to backfill account row"
                    );
                    report.failures += 1;
                }
            }
        }

        info!(
            persons = report.persons_examined,
            missing = report.missing.len(),
            failures = report.failures,
            "account backfill finished"
        );
        Ok(report)
    }
}

fn hr_identifier(person: &Person, account_type: AccountType) -> Option<String> {
    match account_type {
        AccountType::Mail => person.email_address(),
        AccountType::Directory | AccountType::Chat => person.employee_account(),
    }
    .map(str::to_owned)
}
