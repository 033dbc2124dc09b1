//! Engine thresholds resolved from configuration.

use crate::config::{ConfigError, ConfigService, keys};
use crate::identity::domain::AccountType;

/// Failure count at which a task stops being picked up, absent configuration.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Returns the configured retry cap.
///
/// # Errors
///
/// Returns [`ConfigError::Store`] when configuration cannot be read.
pub async fn max_retries(config: &ConfigService) -> Result<u32, ConfigError> {
    config.get_u32(keys::MAX_RETRIES, DEFAULT_MAX_RETRIES).await
}

/// Returns the employment statuses eligible for provisioning.
///
/// # Errors
///
/// Returns [`ConfigError::Store`] when configuration cannot be read.
pub async fn valid_employee_statuses(config: &ConfigService) -> Result<Vec<String>, ConfigError> {
    config
        .get_json(keys::VALID_EMPLOYEE_STATUSES, vec!["1".to_owned()])
        .await
}

/// Returns the enabled account types in provisioning precedence.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the list names an unknown type.
pub async fn enabled_account_types(
    config: &ConfigService,
) -> Result<Vec<AccountType>, ConfigError> {
    let defaults = AccountType::ALL
        .iter()
        .map(|account_type| account_type.as_str().to_owned())
        .collect();
    let raw: Vec<String> = config
        .get_json(keys::ENABLED_ACCOUNT_TYPES, defaults)
        .await?;
    let parsed = raw
        .iter()
        .map(|value| {
            AccountType::try_from(value.as_str()).map_err(|err| ConfigError::Invalid {
                key: keys::ENABLED_ACCOUNT_TYPES.to_owned(),
                reason: err.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AccountType::in_precedence(parsed))
}
