//! Directory (single sign-on) provider.

use super::{check_envelope, endpoint, exchanged_credential};
use crate::config::{ConfigError, ConfigService, keys};
use crate::identity::domain::AccountType;
use crate::provisioning::domain::ProvisioningResult;
use crate::provisioning::ports::{
    AccountProvider, CallStage, Credential, CredentialSource, ProviderRequest, ProviderResponse,
    ProvisioningError, ProvisioningPayload,
};
use serde_json::{Value, json};

const TOKEN_SUCCESS_CODE: &str = "201";
const ONBOARDING_SUCCESS_CODE: &str = "201";
const DEFAULT_EXPIRES_IN_SECS: i64 = 86_399;

/// Settings the directory provider needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySettings {
    /// API base URL.
    pub api_base: String,
    /// Service account used for the token exchange.
    pub account: String,
    /// Service secret used for the token exchange.
    pub secret: String,
    /// Enterprise identifier embedded in the onboarding path.
    pub enterprise_id: String,
    /// User type used when the person type has no mapping.
    pub default_user_type: String,
}

impl DirectorySettings {
    /// Resolves the settings from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for any absent required key.
    pub async fn load(config: &ConfigService) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: config.require(keys::DIRECTORY_API_BASE).await?,
            account: config.require(keys::DIRECTORY_ACCOUNT).await?,
            secret: config.require(keys::DIRECTORY_SECRET).await?,
            enterprise_id: config.require(keys::DIRECTORY_ENTERPRISE_ID).await?,
            default_user_type: config
                .get_or(keys::DIRECTORY_DEFAULT_USER_TYPE, "supplier")
                .await?,
        })
    }
}

/// Creates directory users through the enterprise onboarding API.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    settings: DirectorySettings,
}

impl DirectoryProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new(settings: DirectorySettings) -> Self {
        Self { settings }
    }
}

impl AccountProvider for DirectoryProvider {
    fn account_type(&self) -> AccountType {
        AccountType::Directory
    }

    fn credential_source(&self) -> CredentialSource {
        let body = json!({
            "data": {
                "type": "token",
                "attributes": {
                    "account": self.settings.account,
                    "secret": self.settings.secret,
                }
            }
        });
        CredentialSource::Exchange(ProviderRequest::post(
            endpoint(&self.settings.api_base, "/api/iam/auth/enterprise-token"),
            body,
        ))
    }

    fn interpret_credential(
        &self,
        response: &ProviderResponse,
    ) -> Result<Credential, ProvisioningError> {
        exchanged_credential(
            AccountType::Directory,
            response,
            TOKEN_SUCCESS_CODE,
            DEFAULT_EXPIRES_IN_SECS,
        )
    }

    fn build_request(
        &self,
        token: &str,
        payload: &ProvisioningPayload,
    ) -> Result<ProviderRequest, ProvisioningError> {
        let org_unit = payload
            .department
            .as_ref()
            .and_then(|mapping| mapping.usable_org_unit())
            .ok_or_else(|| ProvisioningError::MappingMissing {
                department_code: payload.department_code.clone(),
            })?;
        let user_type = payload
            .person_type
            .as_ref()
            .map_or(self.settings.default_user_type.as_str(), |mapping| {
                mapping.directory_user_type.as_str()
            });

        let body = json!({
            "userInfo": {
                "employeeNumber": payload.employee_number,
                "name": payload.full_name,
                "englishName": payload.romanized_name,
                "userName": payload.username,
                "userType": user_type,
                "email": payload.email,
                "mobileCountryCode": "+86",
                "mobile": payload.mobile,
                "userExtends": {
                    "workArea": "China",
                    "ou": org_unit,
                }
            }
        });
        let path = format!(
            "/api/idaas/idm-openapi/enterprise/{}/user/onboarding",
            self.settings.enterprise_id
        );
        Ok(
            ProviderRequest::post(endpoint(&self.settings.api_base, &path), body)
                .with_header("Authorization", token),
        )
    }

    fn interpret_response(
        &self,
        response: &ProviderResponse,
        payload: &ProvisioningPayload,
    ) -> Result<ProvisioningResult, ProvisioningError> {
        check_envelope(
            AccountType::Directory,
            CallStage::Provision,
            response,
            ONBOARDING_SUCCESS_CODE,
        )?;
        let mapping = payload.department.as_ref();
        Ok(ProvisioningResult::new(payload.username.clone())
            .with_field("email", Value::String(payload.email.clone()))
            .with_field("service_response", response.body.clone())
            .with_field(
                "department_mapping",
                json!({
                    "source_code": payload.department_code,
                    "directory_code": mapping.map(|m| m.directory_department_code.clone()),
                    "org_unit": mapping.and_then(|m| m.org_unit.clone()),
                }),
            ))
    }
}
