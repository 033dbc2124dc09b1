//! Identity provider capability and transport ports.
//!
//! A provider knows its wire format: how to obtain a credential, how to
//! shape the provisioning request, and how to read the response envelope.
//! The transport only moves JSON over HTTP.

use super::ProvisioningError;
use crate::identity::domain::{AccountType, DepartmentMapping, EmployeeNumber, PersonTypeMapping};
use crate::provisioning::domain::ProvisioningResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Outbound JSON `POST` to an identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Absolute endpoint URL.
    pub url: String,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: Value,
}

impl ProviderRequest {
    /// Creates a request without extra headers.
    #[must_use]
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Raw provider response.
///
/// Bodies that are not JSON are carried as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Value,
}

impl ProviderResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the envelope `code` as a string, accepting numeric codes.
    #[must_use]
    pub fn envelope_code(&self) -> Option<String> {
        match self.body.get("code")? {
            Value::String(code) => Some(code.trim().to_owned()),
            Value::Number(code) => Some(code.to_string()),
            _ => None,
        }
    }
}

/// Errors raised while moving a request to a provider.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The provider did not answer within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Endpoint URL.
        url: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Endpoint URL.
        url: String,
        /// Underlying client error.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl TransportError {
    /// Wraps a client error for `url`.
    pub fn request(
        url: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Request {
            url: url.into(),
            source: Arc::new(err),
        }
    }
}

/// Sends provider requests.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// Sends `request` and returns the provider's response, whatever its
    /// status.
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, TransportError>;
}

/// Where a provider's bearer credential comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    /// Exchanged at a token endpoint; the result is cached.
    Exchange(ProviderRequest),
    /// Configured directly.
    Static(String),
}

/// A bearer credential returned by a token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Token value sent in the provider's authorization header.
    pub token: String,
    /// Lifetime reported by the provider, in seconds.
    pub expires_in_secs: i64,
}

/// Everything a provider needs to provision one person.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningPayload {
    /// Person's employee number.
    pub employee_number: EmployeeNumber,
    /// Native-script full name.
    pub full_name: String,
    /// Romanized name with syllables joined.
    pub romanized_name: String,
    /// Generated username: initials plus employee number.
    pub username: String,
    /// Reserved mailbox address.
    pub email: String,
    /// Preferred telephone number, possibly empty.
    pub mobile: String,
    /// HR department code.
    pub department_code: String,
    /// Mapping for the department, if one exists.
    pub department: Option<DepartmentMapping>,
    /// Mapping for the person type, if one exists.
    pub person_type: Option<PersonTypeMapping>,
}

impl ProvisioningPayload {
    /// Returns the mailbox alias: the local part of the reserved address.
    #[must_use]
    pub fn mail_alias(&self) -> &str {
        self.email
            .split_once('@')
            .map_or(self.email.as_str(), |(local, _)| local)
    }
}

/// Wire-format strategy for one identity provider.
pub trait AccountProvider: Send + Sync {
    /// Returns the account type this provider creates.
    fn account_type(&self) -> AccountType;

    /// Describes how to obtain the bearer credential.
    fn credential_source(&self) -> CredentialSource;

    /// Reads a token exchange response.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Rejected`] or
    /// [`ProvisioningError::MalformedResponse`] when no usable token came back.
    fn interpret_credential(
        &self,
        response: &ProviderResponse,
    ) -> Result<Credential, ProvisioningError>;

    /// Builds the provisioning request.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::MappingMissing`] when the provider needs
    /// a department mapping the payload lacks.
    fn build_request(
        &self,
        token: &str,
        payload: &ProvisioningPayload,
    ) -> Result<ProviderRequest, ProvisioningError>;

    /// Reads the provisioning response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Rejected`] for non-2xx statuses and for
    /// envelopes that do not report success.
    fn interpret_response(
        &self,
        response: &ProviderResponse,
        payload: &ProvisioningPayload,
    ) -> Result<ProvisioningResult, ProvisioningError>;
}
