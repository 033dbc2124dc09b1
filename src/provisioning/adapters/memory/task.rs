//! In-memory repository for provisioning tasks.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::identity::domain::{AccountType, EmployeeNumber};
use crate::provisioning::{
    domain::{AttemptNumber, ProvisioningTask, TaskExecutionLog, TaskId, TaskStatus},
    ports::{TaskCandidate, TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Tasks keep their insertion order, which breaks ties between tasks created
/// at the same instant.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, ProvisioningTask>,
    insertion_order: Vec<TaskId>,
    logs: HashMap<TaskId, Vec<TaskExecutionLog>>,
}

impl InMemoryTaskState {
    fn ordered(&self) -> impl Iterator<Item = &ProvisioningTask> {
        self.insertion_order
            .iter()
            .filter_map(|id| self.tasks.get(id))
    }

    fn failure_count(&self, id: TaskId) -> u32 {
        self.logs
            .get(&id)
            .map_or(0, |entries| u32::try_from(entries.len()).unwrap_or(u32::MAX))
    }

    /// Finds another active task for the same pair as `task`.
    fn conflicting_active(&self, task: &ProvisioningTask) -> Option<TaskId> {
        if !task.status().is_active() {
            return None;
        }
        self.tasks
            .values()
            .find(|other| {
                other.id() != task.id()
                    && other.status().is_active()
                    && other.employee_number() == task.employee_number()
                    && other.account_type() == task.account_type()
            })
            .map(ProvisioningTask::id)
    }

    /// Whether a failed task has been replaced by a newer active task.
    fn is_superseded(&self, task: &ProvisioningTask) -> bool {
        task.status() == TaskStatus::Failed
            && self.tasks.values().any(|other| {
                other.id() != task.id()
                    && other.status().is_active()
                    && other.employee_number() == task.employee_number()
                    && other.account_type() == task.account_type()
            })
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn duplicate_active(task: &ProvisioningTask) -> TaskRepositoryError {
    TaskRepositoryError::DuplicateActiveTask {
        employee_number: task.employee_number().clone(),
        account_type: task.account_type(),
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &ProvisioningTask) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        if state.conflicting_active(task).is_some() {
            return Err(duplicate_active(task));
        }
        state.insertion_order.push(task.id());
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &ProvisioningTask) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        if state.conflicting_active(task).is_some() {
            return Err(duplicate_active(task));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<ProvisioningTask>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_active(
        &self,
        employee_number: &EmployeeNumber,
        account_type: AccountType,
    ) -> TaskRepositoryResult<Option<ProvisioningTask>> {
        let state = self.read()?;
        let task = state
            .ordered()
            .find(|task| {
                task.status().is_active()
                    && task.employee_number() == employee_number
                    && task.account_type() == account_type
            })
            .cloned();
        Ok(task)
    }

    async fn find_candidates(
        &self,
        max_retries: u32,
        limit: usize,
    ) -> TaskRepositoryResult<Vec<TaskCandidate>> {
        let state = self.read()?;
        let mut candidates: Vec<(usize, TaskCandidate)> = state
            .ordered()
            .enumerate()
            .filter(|(_, task)| task.status().is_runnable() && !state.is_superseded(task))
            .map(|(position, task)| {
                let candidate = TaskCandidate {
                    task: task.clone(),
                    retry_count: state.failure_count(task.id()),
                };
                (position, candidate)
            })
            .filter(|(_, candidate)| {
                candidate.task.status() == TaskStatus::Pending
                    || candidate.retry_count < max_retries
            })
            .collect();
        candidates.sort_by_key(|(position, candidate)| (candidate.task.created_at(), *position));
        Ok(candidates
            .into_iter()
            .take(limit)
            .map(|(_, candidate)| candidate)
            .collect())
    }

    async fn record_failure(
        &self,
        task: &ProvisioningTask,
        log: &TaskExecutionLog,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        let expected = AttemptNumber::after(state.failure_count(task.id()));
        if log.attempt() != expected {
            return Err(TaskRepositoryError::AttemptConflict {
                task_id: task.id(),
                expected,
                actual: log.attempt(),
            });
        }
        state.logs.entry(task.id()).or_default().push(log.clone());
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn execution_logs(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskExecutionLog>> {
        Ok(self.read()?.logs.get(&id).cloned().unwrap_or_default())
    }

    async fn failure_count(&self, id: TaskId) -> TaskRepositoryResult<u32> {
        Ok(self.read()?.failure_count(id))
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<ProvisioningTask>> {
        let state = self.read()?;
        let mut tasks: Vec<(usize, ProvisioningTask)> = state
            .ordered()
            .enumerate()
            .filter(|(_, task)| filter.matches(task))
            .map(|(position, task)| (position, task.clone()))
            .collect();
        tasks.sort_by(|(left_pos, left), (right_pos, right)| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then(right_pos.cmp(left_pos))
        });
        Ok(tasks.into_iter().map(|(_, task)| task).collect())
    }
}
