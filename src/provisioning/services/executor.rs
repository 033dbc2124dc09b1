//! Provisioning executor: one provider call sequence per task.

use super::naming::{EmailAllocator, RomanizedName, username};
use super::settings::enabled_account_types;
use crate::config::{ConfigService, keys};
use crate::identity::domain::{AccountType, Person};
use crate::identity::ports::{EmailRegistry, MappingRepository};
use crate::provisioning::adapters::providers::provider_for;
use crate::provisioning::domain::ProvisioningResult;
use crate::provisioning::ports::{
    AccountProvider, AccountProvisioner, CallStage, CredentialCache, CredentialSource,
    ProviderTransport, ProvisioningError, ProvisioningPayload,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const UNAUTHORIZED: u16 = 401;

/// Executes provisioning calls against the identity providers.
///
/// Providers are resolved per call from the closed [`AccountType`] set, and
/// bearer credentials are shared through the [`CredentialCache`].
#[derive(Clone)]
pub struct ProvisioningExecutor {
    config: ConfigService,
    mappings: Arc<dyn MappingRepository>,
    emails: EmailAllocator,
    credentials: Arc<dyn CredentialCache>,
    transport: Arc<dyn ProviderTransport>,
}

impl std::fmt::Debug for ProvisioningExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningExecutor")
            .field("config", &self.config)
            .field("emails", &self.emails)
            .finish_non_exhaustive()
    }
}

impl ProvisioningExecutor {
    /// Creates an executor.
    #[must_use]
    pub fn new(
        config: ConfigService,
        mappings: Arc<dyn MappingRepository>,
        registry: Arc<dyn EmailRegistry>,
        credentials: Arc<dyn CredentialCache>,
        transport: Arc<dyn ProviderTransport>,
    ) -> Self {
        Self {
            config,
            mappings,
            emails: EmailAllocator::new(registry),
            credentials,
            transport,
        }
    }

    /// Resolves names, mappings, and the mailbox address for a person.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when lookups or address allocation fail.
    pub async fn build_payload(
        &self,
        person: &Person,
        department_code: &str,
    ) -> Result<ProvisioningPayload, ProvisioningError> {
        let department = self.mappings.department_mapping(department_code).await?;
        if department.is_none() {
            warn!(department_code, "no department mapping found");
        }
        let person_type = self
            .mappings
            .person_type_mapping(person.person_type())
            .await?;

        let domain = match person_type.as_ref() {
            Some(mapping) if !mapping.email_domain.trim().is_empty() => {
                mapping.email_domain.clone()
            }
            _ => self.config.get_or(keys::EMAIL_DOMAIN, "@example.com").await?,
        };

        let name = RomanizedName::for_person(person);
        let email = self
            .emails
            .allocate(person.employee_number(), &name, &domain)
            .await?;

        Ok(ProvisioningPayload {
            employee_number: person.employee_number().clone(),
            full_name: person.full_name().to_owned(),
            romanized_name: name.joined(),
            username: username(&name, person.employee_number()),
            email,
            mobile: person.primary_phone().to_owned(),
            department_code: department_code.to_owned(),
            department,
            person_type,
        })
    }

    async fn bearer_token(
        &self,
        provider: &dyn AccountProvider,
    ) -> Result<String, ProvisioningError> {
        let request = match provider.credential_source() {
            CredentialSource::Static(token) => return Ok(token),
            CredentialSource::Exchange(request) => request,
        };
        let account_type = provider.account_type();
        let key = account_type.as_str();

        match self.credentials.get(key).await {
            Ok(Some(token)) => return Ok(token),
            Ok(None) => {}
            Err(err) => warn!(provider = key, error = %err, "credential cache read failed"),
        }

        debug!(provider = key, "exchanging credential");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|source| ProvisioningError::Transport {
                provider: account_type,
                stage: CallStage::Credential,
                source,
            })?;
        let credential = provider.interpret_credential(&response)?;
        if let Err(err) = self
            .credentials
            .put(key, &credential.token, credential.expires_in_secs)
            .await
        {
            warn!(provider = key, error = %err, "credential cache write failed");
        }
        Ok(credential.token)
    }
}

#[async_trait]
impl AccountProvisioner for ProvisioningExecutor {
    #[instrument(skip(self))]
    async fn preflight(&self) -> Result<(), ProvisioningError> {
        for account_type in enabled_account_types(&self.config).await? {
            provider_for(&self.config, account_type).await?;
        }
        Ok(())
    }

    #[instrument(
        skip(self, person),
        fields(employee_number = %person.employee_number(), account_type = %account_type)
    )]
    async fn provision(
        &self,
        person: &Person,
        account_type: AccountType,
        department_code: &str,
    ) -> Result<ProvisioningResult, ProvisioningError> {
        let provider = provider_for(&self.config, account_type).await?;
        let payload = self.build_payload(person, department_code).await?;
        let token = self.bearer_token(provider.as_ref()).await?;
        let request = provider.build_request(&token, &payload)?;

        let response =
            self.transport
                .send(request)
                .await
                .map_err(|source| ProvisioningError::Transport {
                    provider: account_type,
                    stage: CallStage::Provision,
                    source,
                })?;
        if response.status == UNAUTHORIZED
            && let Err(err) = self.credentials.invalidate(account_type.as_str()).await
        {
            warn!(error = %err, "credential cache invalidation failed");
        }

        let result = provider.interpret_response(&response, &payload)?;
        info!(
            account_identifier = result.account_identifier(),
            "account provisioned"
        );
        Ok(result)
    }
}
