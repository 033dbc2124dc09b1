//! Shared world state for task retry BDD scenarios.

use accountsync::config::{
    ConfigService,
    adapters::{InMemoryConfigStore, MapEnv},
    ports::ConfigStore,
};
use accountsync::identity::{
    adapters::InMemoryIdentityStore,
    domain::{AccountType, Person},
    ports::{AccountRepository, PersonRepository},
};
use accountsync::provisioning::{
    adapters::memory::InMemoryTaskRepository,
    domain::{ProvisioningResult, TaskId},
    ports::{AccountProvisioner, CallStage, ProvisioningError},
    services::{BatchProcessor, BatchReport, TaskAdminService},
};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Provisioner whose providers can be switched between failing and healthy.
#[derive(Debug, Default)]
pub struct SwitchableProvisioner {
    failing: Mutex<HashSet<AccountType>>,
}

impl SwitchableProvisioner {
    /// Makes `account_type` fail (`true`) or succeed (`false`).
    pub fn set_failing(&self, account_type: AccountType, failing: bool) {
        let mut set = self.failing.lock().expect("failing lock");
        if failing {
            set.insert(account_type);
        } else {
            set.remove(&account_type);
        }
    }
}

#[async_trait]
impl AccountProvisioner for SwitchableProvisioner {
    async fn preflight(&self) -> Result<(), ProvisioningError> {
        Ok(())
    }

    async fn provision(
        &self,
        person: &Person,
        account_type: AccountType,
        _department_code: &str,
    ) -> Result<ProvisioningResult, ProvisioningError> {
        if self
            .failing
            .lock()
            .expect("failing lock")
            .contains(&account_type)
        {
            return Err(ProvisioningError::Rejected {
                provider: account_type,
                stage: CallStage::Provision,
                status: 503,
                message: "service unavailable".to_owned(),
                body: Value::Null,
            });
        }
        Ok(ProvisioningResult::new(format!(
            "{account_type}-{}",
            person.employee_number()
        )))
    }
}

/// Processor type used by the BDD world.
pub type TestBatchProcessor = BatchProcessor<InMemoryTaskRepository, DefaultClock>;

/// Scenario world for task retry behaviour tests.
pub struct TaskRetryWorld {
    pub tasks: Arc<InMemoryTaskRepository>,
    pub identity: Arc<InMemoryIdentityStore>,
    pub settings: Arc<InMemoryConfigStore>,
    pub provisioner: Arc<SwitchableProvisioner>,
    pub task_ids: HashMap<AccountType, TaskId>,
    pub last_report: Option<BatchReport>,
}

impl TaskRetryWorld {
    /// Creates a world with empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(InMemoryTaskRepository::new()),
            identity: Arc::new(InMemoryIdentityStore::new()),
            settings: Arc::new(InMemoryConfigStore::new()),
            provisioner: Arc::new(SwitchableProvisioner::default()),
            task_ids: HashMap::new(),
            last_report: None,
        }
    }

    /// Builds a batch processor over the world's stores.
    pub fn processor(&self) -> TestBatchProcessor {
        BatchProcessor::new(
            Arc::clone(&self.tasks),
            Arc::clone(&self.identity) as Arc<dyn PersonRepository>,
            Arc::clone(&self.identity) as Arc<dyn AccountRepository>,
            Arc::clone(&self.provisioner) as Arc<dyn AccountProvisioner>,
            ConfigService::new(
                Arc::clone(&self.settings) as Arc<dyn ConfigStore>,
                Arc::new(MapEnv::default()),
            ),
            Arc::new(DefaultClock),
        )
    }

    /// Builds an admin service over the world's stores.
    pub fn admin(&self) -> TaskAdminService<InMemoryTaskRepository, DefaultClock> {
        TaskAdminService::new(
            Arc::clone(&self.tasks),
            self.processor(),
            Arc::new(DefaultClock),
        )
    }

    /// Returns the task created for `account_type`.
    ///
    /// # Errors
    ///
    /// Returns an error when the scenario created no such task.
    pub fn task_id(&self, account_type: AccountType) -> Result<TaskId, eyre::Report> {
        self.task_ids
            .get(&account_type)
            .copied()
            .ok_or_else(|| eyre::eyre!("no {account_type} task in scenario world"))
    }
}

impl Default for TaskRetryWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskRetryWorld {
    TaskRetryWorld::default()
}

/// Parses an account type named in a scenario.
///
/// # Errors
///
/// Returns an error for unknown names.
pub fn account_type(name: &str) -> Result<AccountType, eyre::Report> {
    AccountType::try_from(name).map_err(|err| eyre::eyre!("invalid account type: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
