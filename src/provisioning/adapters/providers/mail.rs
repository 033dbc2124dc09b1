//! Mailbox provider.

use super::{check_envelope, endpoint};
use crate::config::{ConfigError, ConfigService, keys};
use crate::identity::domain::AccountType;
use crate::provisioning::domain::ProvisioningResult;
use crate::provisioning::ports::{
    AccountProvider, CallStage, Credential, CredentialSource, ProviderRequest, ProviderResponse,
    ProvisioningError, ProvisioningPayload,
};
use serde_json::{Value, json};

const SUCCESS_CODE: &str = "200";

/// Settings the mail provider needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    /// Mail API base URL.
    pub api_base: String,
    /// Static authorization token.
    pub auth_token: String,
}

impl MailSettings {
    /// Resolves the settings from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for any absent required key.
    pub async fn load(config: &ConfigService) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: config.require(keys::MAIL_API_BASE).await?,
            auth_token: config.require(keys::MAIL_AUTH_TOKEN).await?,
        })
    }
}

/// Enables mailboxes for directory accounts.
#[derive(Debug, Clone)]
pub struct MailProvider {
    settings: MailSettings,
}

impl MailProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new(settings: MailSettings) -> Self {
        Self { settings }
    }
}

fn has_failures(body: &Value) -> bool {
    match body.get("FailedList") {
        None | Some(Value::Null) => false,
        Some(Value::Array(entries)) => !entries.is_empty(),
        Some(Value::Object(entries)) => !entries.is_empty(),
        Some(Value::String(entry)) => !entry.trim().is_empty(),
        Some(_) => true,
    }
}

impl AccountProvider for MailProvider {
    fn account_type(&self) -> AccountType {
        AccountType::Mail
    }

    fn credential_source(&self) -> CredentialSource {
        CredentialSource::Static(self.settings.auth_token.clone())
    }

    fn interpret_credential(
        &self,
        response: &ProviderResponse,
    ) -> Result<Credential, ProvisioningError> {
        Err(ProvisioningError::MalformedResponse {
            provider: AccountType::Mail,
            stage: CallStage::Credential,
            reason: "mail uses a static token and has no credential exchange".to_owned(),
            body: response.body.clone(),
        })
    }

    fn build_request(
        &self,
        token: &str,
        payload: &ProvisioningPayload,
    ) -> Result<ProviderRequest, ProvisioningError> {
        let body = json!({
            "EnableMailboxList": [{
                "SAMAccountName": payload.username,
                "Alias": payload.mail_alias(),
            }]
        });
        Ok(ProviderRequest::post(
            endpoint(&self.settings.api_base, "/api/Exchange/EnableMailbox"),
            body,
        )
        .with_header("Authorization", token))
    }

    fn interpret_response(
        &self,
        response: &ProviderResponse,
        payload: &ProvisioningPayload,
    ) -> Result<ProvisioningResult, ProvisioningError> {
        check_envelope(AccountType::Mail, CallStage::Provision, response, SUCCESS_CODE)?;
        if has_failures(&response.body) {
            return Err(ProvisioningError::Rejected {
                provider: AccountType::Mail,
                stage: CallStage::Provision,
                status: response.status,
                message: "mailbox service reported failed entries".to_owned(),
                body: response.body.clone(),
            });
        }
        Ok(ProvisioningResult::new(payload.email.clone())
            .with_field("username", Value::String(payload.username.clone()))
            .with_field("alias", Value::String(payload.mail_alias().to_owned()))
            .with_field("service_response", response.body.clone()))
    }
}
