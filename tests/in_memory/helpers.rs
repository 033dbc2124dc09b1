//! Shared test helpers for in-memory provisioning integration tests.

use accountsync::config::{
    ConfigService,
    adapters::{InMemoryConfigStore, MapEnv},
};
use accountsync::identity::{
    adapters::InMemoryIdentityStore,
    domain::{AccountType, DepartmentInfo, DepartmentMapping, EmployeeNumber, Person},
    ports::{AccountRepository, EmailRegistry, MappingRepository, PersonRepository},
};
use accountsync::provisioning::{
    adapters::memory::{InMemoryCredentialCache, InMemoryTaskRepository},
    ports::{ProviderRequest, ProviderResponse, ProviderTransport, TransportError},
    services::{BatchProcessor, ProvisioningExecutor, TaskCreator},
};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Provider settings that satisfy preflight for every account type.
pub const PROVIDER_SETTINGS: [(&str, &str); 10] = [
    ("directory_api_base", "http://directory.test"),
    ("directory_account", "svc"),
    ("directory_secret", "secret"),
    ("directory_enterprise_id", "ent-1"),
    ("chat_auth_base", "http://chat-auth.test"),
    ("chat_api_base", "http://chat.test"),
    ("chat_client_id", "client"),
    ("chat_client_secret", "client-secret"),
    ("mail_api_base", "http://mail.test"),
    ("mail_auth_token", "mail-token"),
];

/// Endpoint suffix of the directory onboarding call.
pub const DIRECTORY_ONBOARDING: &str = "/user/onboarding";
/// Endpoint suffix of the chat user creation call.
pub const CHAT_CREATE: &str = "/api/contact/v1/user/create";
/// Endpoint suffix of the mailbox enable call.
pub const MAIL_ENABLE: &str = "/api/Exchange/EnableMailbox";
/// Endpoint suffix of the directory token exchange.
pub const DIRECTORY_TOKEN: &str = "/api/iam/auth/enterprise-token";

/// Transport answering every provider endpoint with a success envelope.
///
/// Endpoints registered through [`ScriptedTransport::fail`] answer with an
/// HTTP 500 until [`ScriptedTransport::recover`] is called.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    requests: Mutex<Vec<ProviderRequest>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl ScriptedTransport {
    /// Makes requests whose URL ends with `suffix` fail.
    pub fn fail(&self, suffix: &'static str) {
        self.failing.lock().expect("failing lock").insert(suffix);
    }

    /// Lets requests whose URL ends with `suffix` succeed again.
    pub fn recover(&self, suffix: &'static str) {
        self.failing.lock().expect("failing lock").remove(suffix);
    }

    /// Returns the bodies of the requests sent to `suffix`.
    pub fn bodies_sent_to(&self, suffix: &str) -> Vec<Value> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .filter(|request| request.url.ends_with(suffix))
            .map(|request| request.body.clone())
            .collect()
    }

    fn answer(url: &str) -> Value {
        if url.ends_with(DIRECTORY_TOKEN) {
            json!({"code": "201", "access_token": "directory-token", "expires_in": 7200})
        } else if url.ends_with("/api/auth/v2/tickets") {
            json!({"code": "0", "access_token": "chat-token", "expires_in": 7200})
        } else if url.ends_with(DIRECTORY_ONBOARDING) {
            json!({"code": "201", "data": {}})
        } else if url.ends_with(CHAT_CREATE) {
            json!({"code": "0"})
        } else if url.ends_with(MAIL_ENABLE) {
            json!({"code": "200", "FailedList": []})
        } else {
            json!({"code": "404", "message": "unknown endpoint"})
        }
    }
}

#[async_trait]
impl ProviderTransport for ScriptedTransport {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, TransportError> {
        let failing = self
            .failing
            .lock()
            .expect("failing lock")
            .iter()
            .any(|suffix| request.url.ends_with(suffix));
        let response = if failing {
            ProviderResponse {
                status: 500,
                body: json!({"message": "service unavailable"}),
            }
        } else {
            ProviderResponse {
                status: 200,
                body: Self::answer(&request.url),
            }
        };
        self.requests.lock().expect("requests lock").push(request);
        Ok(response)
    }
}

/// Processor type used by the integration tests.
pub type TestBatchProcessor = BatchProcessor<InMemoryTaskRepository, DefaultClock>;
/// Creator type used by the integration tests.
pub type TestTaskCreator = TaskCreator<InMemoryTaskRepository, DefaultClock>;

/// In-memory stores wired to a real executor and a scripted transport.
pub struct Platform {
    /// Task store.
    pub tasks: Arc<InMemoryTaskRepository>,
    /// Person, account, mapping, and address store.
    pub identity: Arc<InMemoryIdentityStore>,
    /// Provider transport.
    pub transport: Arc<ScriptedTransport>,
    /// Settings service.
    pub config: ConfigService,
}

impl Platform {
    /// Creates a platform with the provider settings plus `overrides`.
    pub fn with_settings(overrides: &[(&str, &str)]) -> Self {
        let mut values: Vec<(&str, &str)> = PROVIDER_SETTINGS.to_vec();
        values.extend_from_slice(overrides);
        Self {
            tasks: Arc::new(InMemoryTaskRepository::new()),
            identity: Arc::new(InMemoryIdentityStore::new()),
            transport: Arc::new(ScriptedTransport::default()),
            config: ConfigService::new(
                Arc::new(InMemoryConfigStore::with_values(values)),
                Arc::new(MapEnv::default()),
            ),
        }
    }

    /// Builds a task creator over the platform stores.
    pub fn creator(&self) -> TestTaskCreator {
        TaskCreator::new(
            Arc::clone(&self.tasks),
            Arc::clone(&self.identity) as Arc<dyn PersonRepository>,
            self.config.clone(),
            Arc::new(DefaultClock),
        )
    }

    /// Builds a batch processor provisioning through the scripted transport.
    pub fn processor(&self) -> TestBatchProcessor {
        let clock = Arc::new(DefaultClock);
        let executor = ProvisioningExecutor::new(
            self.config.clone(),
            Arc::clone(&self.identity) as Arc<dyn MappingRepository>,
            Arc::clone(&self.identity) as Arc<dyn EmailRegistry>,
            Arc::new(InMemoryCredentialCache::new(Arc::clone(&clock))),
            Arc::clone(&self.transport) as Arc<dyn ProviderTransport>,
        );
        BatchProcessor::new(
            Arc::clone(&self.tasks),
            Arc::clone(&self.identity) as Arc<dyn PersonRepository>,
            Arc::clone(&self.identity) as Arc<dyn AccountRepository>,
            Arc::new(executor),
            self.config.clone(),
            clock,
        )
    }

    /// Adds an eligible person in department `D10`.
    pub async fn add_person(&self, employee_number: &str, name: &str) {
        let person = Person::new(number(employee_number), name, "10", "1")
            .expect("valid person")
            .with_department(DepartmentInfo::with_code("D10"))
            .with_telephone_numbers(["13800000000".to_owned()]);
        self.identity.upsert(&person).await.expect("store person");
    }

    /// Maps department `D10` to a directory org unit.
    pub async fn map_department(&self) {
        self.identity
            .save_department_mapping(&DepartmentMapping::new(
                "D10",
                "WW10",
                Some("OU-Engineering".to_owned()),
            ))
            .await
            .expect("store department mapping");
    }

    /// Returns the stored account identifier for a person and type.
    pub async fn account_identifier(
        &self,
        employee_number: &str,
        account_type: AccountType,
    ) -> Option<String> {
        self.identity
            .find(&number(employee_number), account_type)
            .await
            .expect("account lookup")
            .and_then(|account| account.identifier().map(str::to_owned))
    }
}

/// Parses a known-valid employee number.
pub fn number(value: &str) -> EmployeeNumber {
    EmployeeNumber::new(value).expect("valid employee number")
}

/// Provides a platform provisioning every account type.
#[fixture]
pub fn platform() -> Platform {
    Platform::with_settings(&[])
}
