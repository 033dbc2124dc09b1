//! Port contracts for provisioning.

mod credential;
mod provider;
mod provisioner;
mod repository;

pub use credential::{CredentialCache, CredentialCacheError, CredentialCacheResult};
pub use provider::{
    AccountProvider, Credential, CredentialSource, ProviderRequest, ProviderResponse,
    ProviderTransport, ProvisioningPayload, TransportError,
};
pub use provisioner::{AccountProvisioner, CallStage, ProvisioningError};
pub use repository::{
    TaskCandidate, TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
