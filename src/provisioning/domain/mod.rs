//! Domain model for provisioning tasks.
//!
//! Tasks move through `pending -> processing -> completed | failed`, with
//! failed tasks re-entering processing until their failure history reaches
//! the retry cap. Dependencies are stored as task identifiers and resolved by
//! repository lookup.

mod error;
mod execution_log;
mod ids;
mod result;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use execution_log::{ExecutionContext, PersistedLogData, TaskExecutionLog};
pub use ids::{AttemptNumber, TaskId};
pub use result::ProvisioningResult;
pub use task::{DependencyState, PersistedTaskData, ProvisioningTask, TaskStatus};
