//! Repository trait for task persistence.
//!
//! Every operation returns a boxed `'static` future so implementations can
//! be stored behind `Arc<dyn TaskRepository>` and awaited from handlers.
//! Each mutating operation is committed before its future resolves.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{IdentityStrategy, NewTask, Task, TaskId};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// An entity with the same identity already exists.
    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// The identifier does not belong to the repository's identity strategy.
    #[error("Identity mismatch: expected {expected} identifier, got {found}")]
    IdentityMismatch {
        expected: IdentityStrategy,
        found: TaskId,
    },

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Future returned by repository operations.
pub type RepositoryFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for Task entities.
pub trait TaskRepository: Send + Sync {
    /// Returns the identity strategy this repository assigns and accepts.
    fn identity_strategy(&self) -> IdentityStrategy;

    /// Lists all tasks in creation order (primary key order).
    fn list(&self) -> RepositoryFuture<Vec<Task>>;

    /// Finds a task by its ID.
    ///
    /// Returns `Ok(Some(task))` if found, `Ok(None)` if not found,
    /// or an error if the operation fails.
    fn find_by_id(&self, id: &TaskId) -> RepositoryFuture<Option<Task>>;

    /// Persists a new task and returns it with its final identity.
    ///
    /// Under the sequential strategy the store assigns the next integer and
    /// any supplied identity is rejected. Under the uuid strategy the
    /// supplied UUID is kept, or a v7 UUID is generated when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Duplicate`] if the identity is taken.
    fn insert(&self, task: NewTask) -> RepositoryFuture<Task>;

    /// Overwrites the mutable fields of an existing task.
    ///
    /// Returns `Ok(true)` if the task was updated, `Ok(false)` if it didn't exist.
    fn update(&self, task: &Task) -> RepositoryFuture<bool>;

    /// Deletes a task by its ID.
    ///
    /// Returns `Ok(true)` if the task was deleted, `Ok(false)` if it didn't exist.
    fn delete(&self, id: &TaskId) -> RepositoryFuture<bool>;
}

/// Rejects identifiers that do not match the configured strategy.
///
/// # Errors
///
/// Returns [`RepositoryError::IdentityMismatch`] on a mismatch.
pub fn ensure_strategy(
    strategy: IdentityStrategy,
    id: &TaskId,
) -> Result<(), RepositoryError> {
    if id.strategy() == strategy {
        Ok(())
    } else {
        Err(RepositoryError::IdentityMismatch {
            expected: strategy,
            found: *id,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
