//! Enterprise chat provider.

use super::{check_envelope, endpoint, exchanged_credential};
use crate::config::{ConfigError, ConfigService, keys};
use crate::identity::domain::AccountType;
use crate::provisioning::domain::ProvisioningResult;
use crate::provisioning::ports::{
    AccountProvider, CallStage, Credential, CredentialSource, ProviderRequest, ProviderResponse,
    ProvisioningError, ProvisioningPayload,
};
use serde_json::json;

const SUCCESS_CODE: &str = "0";
const DEFAULT_EXPIRES_IN_SECS: i64 = 7_200;

/// Settings the chat provider needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    /// Credential exchange base URL.
    pub auth_base: String,
    /// Contact API base URL.
    pub api_base: String,
    /// Client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Department code used when the HR department has no mapping.
    pub default_department: String,
    /// Person type used when the HR person type has no mapping.
    pub default_person_type: String,
}

impl ChatSettings {
    /// Resolves the settings from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for any absent required key.
    pub async fn load(config: &ConfigService) -> Result<Self, ConfigError> {
        Ok(Self {
            auth_base: config.require(keys::CHAT_AUTH_BASE).await?,
            api_base: config.require(keys::CHAT_API_BASE).await?,
            client_id: config.require(keys::CHAT_CLIENT_ID).await?,
            client_secret: config.require(keys::CHAT_CLIENT_SECRET).await?,
            default_department: config.get_or(keys::CHAT_DEFAULT_DEPARTMENT, "WW10010").await?,
            default_person_type: config
                .get_or(keys::CHAT_DEFAULT_PERSON_TYPE, "contractor")
                .await?,
        })
    }
}

/// Creates chat contacts.
#[derive(Debug, Clone)]
pub struct ChatProvider {
    settings: ChatSettings,
}

impl ChatProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new(settings: ChatSettings) -> Self {
        Self { settings }
    }

    fn department_code<'a>(&'a self, payload: &'a ProvisioningPayload) -> &'a str {
        payload
            .department
            .as_ref()
            .map_or(self.settings.default_department.as_str(), |mapping| {
                mapping.directory_department_code.as_str()
            })
    }
}

impl AccountProvider for ChatProvider {
    fn account_type(&self) -> AccountType {
        AccountType::Chat
    }

    fn credential_source(&self) -> CredentialSource {
        CredentialSource::Exchange(ProviderRequest::post(
            endpoint(&self.settings.auth_base, "/api/auth/v2/tickets"),
            json!({
                "client_id": self.settings.client_id,
                "client_secret": self.settings.client_secret,
            }),
        ))
    }

    fn interpret_credential(
        &self,
        response: &ProviderResponse,
    ) -> Result<Credential, ProvisioningError> {
        exchanged_credential(
            AccountType::Chat,
            response,
            SUCCESS_CODE,
            DEFAULT_EXPIRES_IN_SECS,
        )
    }

    fn build_request(
        &self,
        token: &str,
        payload: &ProvisioningPayload,
    ) -> Result<ProviderRequest, ProvisioningError> {
        let person_type = payload
            .person_type
            .as_ref()
            .map_or(self.settings.default_person_type.as_str(), |mapping| {
                mapping.chat_person_type.as_str()
            });
        let body = json!({
            "corpUserId": payload.employee_number,
            "userNameCn": payload.full_name,
            "mobileNumber": payload.mobile,
            "corpDeptCodes": [self.department_code(payload)],
            "personType": person_type,
            "userEmail": payload.email,
            "employeeId": payload.employee_number,
        });
        Ok(ProviderRequest::post(
            endpoint(&self.settings.api_base, "/api/contact/v1/user/create"),
            body,
        )
        .with_header("x-wlk-Authorization", token))
    }

    fn interpret_response(
        &self,
        response: &ProviderResponse,
        payload: &ProvisioningPayload,
    ) -> Result<ProvisioningResult, ProvisioningError> {
        check_envelope(AccountType::Chat, CallStage::Provision, response, SUCCESS_CODE)?;
        Ok(
            ProvisioningResult::new(payload.employee_number.as_str())
                .with_field("service_response", response.body.clone())
                .with_field(
                    "department_mapping",
                    json!({
                        "source_code": payload.department_code,
                        "chat_department_code": self.department_code(payload),
                    }),
                ),
        )
    }
}
