//! Well-known configuration keys and the default entry set.

use super::ConfigEntry;

/// Enables the task-creation pass.
pub const TASK_AUTO_CREATION_ENABLED: &str = "task_auto_creation_enabled";
/// Enables the batch processing pass.
pub const TASK_PROCESSING_ENABLED: &str = "task_processing_enabled";
/// Maximum recorded failures before a task stops being picked up.
pub const MAX_RETRIES: &str = "account_creation_max_retries";
/// JSON list of employment status codes eligible for provisioning.
pub const VALID_EMPLOYEE_STATUSES: &str = "valid_employee_statuses";
/// JSON list of account types to provision.
pub const ENABLED_ACCOUNT_TYPES: &str = "enabled_account_types";
/// Timeout applied to every identity provider call, in seconds.
pub const PROVIDER_TIMEOUT_SECS: &str = "provider_timeout_secs";

/// Global mailbox domain used when no person-type mapping applies.
pub const EMAIL_DOMAIN: &str = "email_domain";

/// Directory provider API base URL.
pub const DIRECTORY_API_BASE: &str = "directory_api_base";
/// Directory provider service account.
pub const DIRECTORY_ACCOUNT: &str = "directory_account";
/// Directory provider service secret.
pub const DIRECTORY_SECRET: &str = "directory_secret";
/// Directory enterprise identifier.
pub const DIRECTORY_ENTERPRISE_ID: &str = "directory_enterprise_id";
/// User type sent to the directory when no person-type mapping applies.
pub const DIRECTORY_DEFAULT_USER_TYPE: &str = "directory_default_user_type";

/// Chat provider credential-exchange base URL.
pub const CHAT_AUTH_BASE: &str = "chat_auth_base";
/// Chat provider API base URL.
pub const CHAT_API_BASE: &str = "chat_api_base";
/// Chat provider client identifier.
pub const CHAT_CLIENT_ID: &str = "chat_client_id";
/// Chat provider client secret.
pub const CHAT_CLIENT_SECRET: &str = "chat_client_secret";
/// Chat department code used when the department has no mapping.
pub const CHAT_DEFAULT_DEPARTMENT: &str = "chat_default_department";
/// Chat person type used when no person-type mapping applies.
pub const CHAT_DEFAULT_PERSON_TYPE: &str = "chat_default_person_type";

/// Mail provider API base URL.
pub const MAIL_API_BASE: &str = "mail_api_base";
/// Static bearer token for the mail provider.
pub const MAIL_AUTH_TOKEN: &str = "mail_auth_token";

/// Keys whose values are masked when listed.
pub const SENSITIVE_KEYS: [&str; 5] = [
    DIRECTORY_ACCOUNT,
    DIRECTORY_SECRET,
    CHAT_CLIENT_ID,
    CHAT_CLIENT_SECRET,
    MAIL_AUTH_TOKEN,
];

const DEFAULTS: &[(&str, &str, &str)] = &[
    (TASK_AUTO_CREATION_ENABLED, "true", "Enable automatic account task creation"),
    (TASK_PROCESSING_ENABLED, "true", "Enable account task processing"),
    (MAX_RETRIES, "5", "Maximum recorded failures per account task"),
    (VALID_EMPLOYEE_STATUSES, r#"["1"]"#, "Eligible employment status codes (JSON list)"),
    (
        ENABLED_ACCOUNT_TYPES,
        r#"["directory","chat","mail"]"#,
        "Account types to provision (JSON list)",
    ),
    (PROVIDER_TIMEOUT_SECS, "30", "Identity provider call timeout in seconds"),
    (EMAIL_DOMAIN, "@example.com", "Default mailbox domain"),
    (DIRECTORY_API_BASE, "https://directory.example.com", "Directory API base URL"),
    (DIRECTORY_ACCOUNT, "your_directory_account", "Directory service account"),
    (DIRECTORY_SECRET, "your_directory_secret", "Directory service secret"),
    (DIRECTORY_ENTERPRISE_ID, "your_enterprise_id", "Directory enterprise identifier"),
    (DIRECTORY_DEFAULT_USER_TYPE, "supplier", "Fallback directory user type"),
    (CHAT_AUTH_BASE, "https://directory.example.com", "Chat credential exchange base URL"),
    (CHAT_API_BASE, "https://chat.example.com", "Chat API base URL"),
    (CHAT_CLIENT_ID, "your_chat_client_id", "Chat client identifier"),
    (CHAT_CLIENT_SECRET, "your_chat_client_secret", "Chat client secret"),
    (CHAT_DEFAULT_DEPARTMENT, "WW10010", "Fallback chat department code"),
    (CHAT_DEFAULT_PERSON_TYPE, "contractor", "Fallback chat person type"),
    (MAIL_API_BASE, "http://mail.example.com:8080", "Mail API base URL"),
    (MAIL_AUTH_TOKEN, "your_mail_auth_token", "Mail API token"),
];

/// Returns the entries written by a fresh configuration seed.
#[must_use]
pub fn default_entries() -> Vec<ConfigEntry> {
    DEFAULTS
        .iter()
        .map(|(key, value, description)| {
            ConfigEntry::new(*key, *value).with_description(*description)
        })
        .collect()
}

/// Returns `true` when values for `key` must never be displayed in full.
#[must_use]
pub fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEYS.contains(&key)
}

/// Masks a sensitive value, keeping the first and last two characters.
///
/// Values of four characters or fewer are returned unchanged, as are values
/// for keys that are not sensitive.
#[must_use]
pub fn mask_value(key: &str, value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if !is_sensitive(key) || chars.len() <= 4 {
        return value.to_owned();
    }
    let hidden = chars.len().saturating_sub(4);
    let head: String = chars.iter().take(2).collect();
    let tail: String = chars.iter().skip(chars.len().saturating_sub(2)).collect();
    format!("{head}{}{tail}", "*".repeat(hidden))
}
