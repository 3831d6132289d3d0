//! Data Transfer Objects for API responses.
//!
//! Requests are not deserialized into DTOs: payloads are submitted to the
//! forms in [`crate::validation`] so every violation can be reported.

use serde::Serialize;

use crate::domain::{Task, TaskId};

/// Response DTO for a task.
///
/// The identity key follows the strategy: `{"id": 7, ...}` or
/// `{"uuid": "...", ...}`. `description` and `deadline` are always present
/// and `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResponse {
    /// Task identity, flattened to `id` or `uuid`.
    #[serde(flatten)]
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    /// Deadline rendered as `YYYY-MM-DD HH:MM`.
    pub deadline: Option<String>,
    pub completed: bool,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: task.deadline.map(|deadline| deadline.to_string()),
            completed: task.completed,
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}
