//! Shared fixtures for provisioning unit tests.

use crate::config::{ConfigService, adapters::InMemoryConfigStore, adapters::MapEnv};
use crate::identity::domain::{Account, AccountType, DepartmentInfo, EmployeeNumber, Person};
use crate::identity::ports::{AccountRepository, IdentityStoreResult};
use crate::provisioning::domain::{
    ProvisioningResult, ProvisioningTask, TaskExecutionLog, TaskId,
};
use crate::provisioning::ports::{
    AccountProvisioner, ProvisioningError, TaskCandidate, TaskFilter, TaskRepository,
    TaskRepositoryResult,
};
use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;

mock! {
    pub Provisioner {}

    #[async_trait]
    impl AccountProvisioner for Provisioner {
        async fn preflight(&self) -> Result<(), ProvisioningError>;
        async fn provision(
            &self,
            person: &Person,
            account_type: AccountType,
            department_code: &str,
        ) -> Result<ProvisioningResult, ProvisioningError>;
    }
}

mock! {
    pub Tasks {}

    #[async_trait]
    impl TaskRepository for Tasks {
        async fn store(&self, task: &ProvisioningTask) -> TaskRepositoryResult<()>;
        async fn update(&self, task: &ProvisioningTask) -> TaskRepositoryResult<()>;
        async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<ProvisioningTask>>;
        async fn find_active(
            &self,
            employee_number: &EmployeeNumber,
            account_type: AccountType,
        ) -> TaskRepositoryResult<Option<ProvisioningTask>>;
        async fn find_candidates(
            &self,
            max_retries: u32,
            limit: usize,
        ) -> TaskRepositoryResult<Vec<TaskCandidate>>;
        async fn record_failure(
            &self,
            task: &ProvisioningTask,
            log: &TaskExecutionLog,
        ) -> TaskRepositoryResult<()>;
        async fn execution_logs(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskExecutionLog>>;
        async fn failure_count(&self, id: TaskId) -> TaskRepositoryResult<u32>;
        async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<ProvisioningTask>>;
    }
}

mock! {
    pub Accounts {}

    #[async_trait]
    impl AccountRepository for Accounts {
        async fn save(&self, account: &Account) -> IdentityStoreResult<()>;
        async fn find(
            &self,
            employee_number: &EmployeeNumber,
            account_type: AccountType,
        ) -> IdentityStoreResult<Option<Account>>;
        async fn list_for_person(
            &self,
            employee_number: &EmployeeNumber,
        ) -> IdentityStoreResult<Vec<Account>>;
    }
}

pub fn number(value: &str) -> EmployeeNumber {
    EmployeeNumber::new(value).expect("valid employee number")
}

pub fn person(employee_number: &str, name: &str, department_code: &str) -> Person {
    Person::new(number(employee_number), name, "10", "1")
        .expect("valid person")
        .with_department(DepartmentInfo::with_code(department_code))
}

pub fn config(values: &[(&str, &str)]) -> ConfigService {
    ConfigService::new(
        Arc::new(InMemoryConfigStore::with_values(values.iter().copied())),
        Arc::new(MapEnv::default()),
    )
}

/// Every provider setting present, so preflight passes.
pub const PROVIDER_SETTINGS: [(&str, &str); 9] = [
    ("directory_api_base", "http://directory.test"),
    ("directory_account", "svc"),
    ("directory_secret", "secret"),
    ("directory_enterprise_id", "ent-1"),
    ("chat_auth_base", "http://chat-auth.test"),
    ("chat_api_base", "http://chat.test"),
    ("chat_client_id", "client"),
    ("chat_client_secret", "client-secret"),
    ("mail_api_base", "http://mail.test"),
];
