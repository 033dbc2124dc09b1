//! Wire formats of the three identity providers.
//!
//! Each provider is built from settings resolved through [`ConfigService`]
//! at call time, so configuration edits apply to the next task.

mod chat;
mod directory;
mod mail;

pub use chat::{ChatProvider, ChatSettings};
pub use directory::{DirectoryProvider, DirectorySettings};
pub use mail::{MailProvider, MailSettings};

use crate::config::{ConfigError, ConfigService};
use crate::identity::domain::AccountType;
use crate::provisioning::ports::{
    AccountProvider, CallStage, Credential, ProviderResponse, ProvisioningError,
};
use serde_json::Value;

/// Resolves settings and builds the provider for `account_type`.
///
/// # Errors
///
/// Returns [`ConfigError`] when a required setting is missing.
pub async fn provider_for(
    config: &ConfigService,
    account_type: AccountType,
) -> Result<Box<dyn AccountProvider>, ConfigError> {
    Ok(match account_type {
        AccountType::Directory => {
            Box::new(DirectoryProvider::new(DirectorySettings::load(config).await?))
        }
        AccountType::Chat => Box::new(ChatProvider::new(ChatSettings::load(config).await?)),
        AccountType::Mail => Box::new(MailProvider::new(MailSettings::load(config).await?)),
    })
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}

fn provider_message(body: &Value) -> Option<String> {
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_owned)
}

/// Fails unless the response is 2xx with the expected envelope code.
fn check_envelope(
    provider: AccountType,
    stage: CallStage,
    response: &ProviderResponse,
    success_code: &str,
) -> Result<(), ProvisioningError> {
    if !response.is_success() {
        return Err(ProvisioningError::Rejected {
            provider,
            stage,
            status: response.status,
            message: provider_message(&response.body)
                .unwrap_or_else(|| format!("HTTP status {}", response.status)),
            body: response.body.clone(),
        });
    }
    let code = response.envelope_code();
    if code.as_deref() != Some(success_code) {
        let fallback = code.map_or_else(
            || "response carries no code".to_owned(),
            |value| format!("unexpected code {value}"),
        );
        return Err(ProvisioningError::Rejected {
            provider,
            stage,
            status: response.status,
            message: provider_message(&response.body).unwrap_or(fallback),
            body: response.body.clone(),
        });
    }
    Ok(())
}

/// Reads a token-exchange envelope carrying `access_token` and `expires_in`.
fn exchanged_credential(
    provider: AccountType,
    response: &ProviderResponse,
    success_code: &str,
    default_expires_in_secs: i64,
) -> Result<Credential, ProvisioningError> {
    check_envelope(provider, CallStage::Credential, response, success_code)?;
    let token = response
        .body
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ProvisioningError::MalformedResponse {
            provider,
            stage: CallStage::Credential,
            reason: "missing access_token".to_owned(),
            body: response.body.clone(),
        })?;
    let expires_in_secs = response
        .body
        .get("expires_in")
        .and_then(|value| {
            value
                .as_i64()
                .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
        })
        .unwrap_or(default_expires_in_secs);
    Ok(Credential {
        token: token.to_owned(),
        expires_in_secs,
    })
}
