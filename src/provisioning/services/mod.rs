//! Provisioning services: task creation, execution, retry, batch runs, and
//! administration.

pub mod admin;
pub mod batch;
pub mod creator;
pub mod executor;
pub mod naming;
pub mod retry;
pub mod settings;

pub use admin::{
    ResetRejection, ResetReport, RetryNowEntry, RetryNowOutcome, TaskAdminService, TaskDetail,
};
pub use batch::{
    BatchError, BatchProcessor, BatchReport, BatchResult, PlannedAction, PlannedRun, TaskOutcome,
};
pub use creator::{
    CreationOptions, CreationReport, PersonFailure, PlannedTask, TaskCreator, TaskCreatorError,
    TaskCreatorResult,
};
pub use executor::ProvisioningExecutor;
pub use naming::{EmailAllocator, RomanizedName, normalize_domain, username};
pub use retry::{
    FailureOutcome, RetryController, RetryControllerError, RetryControllerResult, should_retry,
};
