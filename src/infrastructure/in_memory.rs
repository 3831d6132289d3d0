//! In-memory repository implementation.
//!
//! Suitable for development and tests. Tasks are kept in insertion order
//! behind `Arc<RwLock<...>>`, so cloned repositories share one store.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{IdentityStrategy, NewTask, Task, TaskId};
use crate::infrastructure::repository::{RepositoryFuture, ensure_strategy};
use crate::infrastructure::{RepositoryError, TaskRepository};

/// Store contents: tasks in insertion order plus the last sequence value.
#[derive(Debug, Default)]
struct TaskStore {
    tasks: Vec<Task>,
    last_sequence: u64,
}

impl TaskStore {
    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == *id)
    }

    /// Assigns the identity of a new task according to `strategy`.
    fn assign_id(
        &mut self,
        strategy: IdentityStrategy,
        requested: Option<TaskId>,
    ) -> Result<TaskId, RepositoryError> {
        match (strategy, requested) {
            (IdentityStrategy::Sequential, None) => {
                self.last_sequence += 1;
                Ok(TaskId::Sequential(self.last_sequence))
            }
            (IdentityStrategy::Uuid, None) => Ok(TaskId::generate_v7()),
            (IdentityStrategy::Sequential, Some(id)) => Err(RepositoryError::IdentityMismatch {
                expected: strategy,
                found: id,
            }),
            (IdentityStrategy::Uuid, Some(id)) => {
                ensure_strategy(strategy, &id)?;
                if self.position(&id).is_some() {
                    return Err(RepositoryError::Duplicate(id.to_string()));
                }
                Ok(id)
            }
        }
    }
}

// =============================================================================
// In-Memory Task Repository
// =============================================================================

/// In-memory implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// let repository = InMemoryTaskRepository::new(IdentityStrategy::Sequential);
/// let task = repository.insert(NewTask::new("My Task")).await?;
///
/// assert_eq!(task.id, TaskId::Sequential(1));
/// let found = repository.find_by_id(&task.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    strategy: IdentityStrategy,
    store: Arc<RwLock<TaskStore>>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new(strategy: IdentityStrategy) -> Self {
        Self {
            strategy,
            store: Arc::new(RwLock::new(TaskStore::default())),
        }
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new(IdentityStrategy::default())
    }
}

#[allow(clippy::significant_drop_tightening)]
impl TaskRepository for InMemoryTaskRepository {
    fn identity_strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    fn list(&self) -> RepositoryFuture<Vec<Task>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let guard = store.read().await;
            Ok(guard.tasks.clone())
        })
    }

    fn find_by_id(&self, id: &TaskId) -> RepositoryFuture<Option<Task>> {
        let store = Arc::clone(&self.store);
        let id = *id;
        Box::pin(async move {
            let guard = store.read().await;
            Ok(guard.tasks.iter().find(|task| task.id == id).cloned())
        })
    }

    fn insert(&self, task: NewTask) -> RepositoryFuture<Task> {
        let store = Arc::clone(&self.store);
        let strategy = self.strategy;
        Box::pin(async move {
            let mut guard = store.write().await;
            let id = guard.assign_id(strategy, task.id)?;
            let task = task.into_task(id);
            guard.tasks.push(task.clone());
            Ok(task)
        })
    }

    fn update(&self, task: &Task) -> RepositoryFuture<bool> {
        let store = Arc::clone(&self.store);
        let task = task.clone();
        Box::pin(async move {
            let mut guard = store.write().await;
            match guard.position(&task.id) {
                Some(index) => {
                    guard.tasks[index] = task;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn delete(&self, id: &TaskId) -> RepositoryFuture<bool> {
        let store = Arc::clone(&self.store);
        let id = *id;
        Box::pin(async move {
            let mut guard = store.write().await;
            match guard.position(&id) {
                Some(index) => {
                    guard.tasks.remove(index);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
