//! HTTP handlers for task endpoints.
//!
//! Handlers receive the request-scoped [`AppState`], validate the path
//! identifier and payload, delegate to the repository, and map every
//! failure to an [`ApiErrorResponse`]. Bodies are read as raw bytes and
//! parsed here so malformed JSON is a 400 regardless of the content type.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
};
use serde::Serialize;
use serde_json::Value;

use super::dto::TaskResponse;
use super::error::ApiErrorResponse;
use crate::domain::{IdentityStrategy, Task, TaskId};
use crate::infrastructure::TaskRepository;
use crate::validation::{
    Form, FormErrorNormalizer, IdentifierForm, Submission, TaskForm, TaskFormMode,
    ValidationResult,
};

// =============================================================================
// Application State
// =============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Task repository for persistence.
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    /// Identity strategy of the running system.
    pub identity_strategy: IdentityStrategy,
}

impl AppState {
    /// Creates the state, taking the identity strategy from the repository.
    #[must_use]
    pub fn new(task_repository: Arc<dyn TaskRepository + Send + Sync>) -> Self {
        let identity_strategy = task_repository.identity_strategy();
        Self {
            task_repository,
            identity_strategy,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppState")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .field("identity_strategy", &self.identity_strategy)
            .finish()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_payload(body: &Bytes) -> Result<Value, ApiErrorResponse> {
    serde_json::from_slice(body).map_err(ApiErrorResponse::from)
}

/// Renders a rejected form, or reports an internal error if the form has
/// nothing to render.
fn validation_failed(form: &Form) -> ApiErrorResponse {
    let normalizer = FormErrorNormalizer;
    if normalizer.supports(form) {
        ApiErrorResponse::ValidationFailed(normalizer.normalize(form))
    } else {
        tracing::error!(form = form.name(), "Rejected form carries no errors");
        ApiErrorResponse::internal_error("An internal error occurred")
    }
}

/// Loads the task named by a raw path identifier.
///
/// An identifier that does not parse under the active strategy cannot name
/// a task and is reported as not found.
async fn load_task(state: &AppState, raw_id: &str) -> Result<Task, ApiErrorResponse> {
    let id = state
        .identity_strategy
        .parse_id(raw_id)
        .ok_or(ApiErrorResponse::NotFound)?;

    state
        .task_repository
        .find_by_id(&id)
        .await?
        .ok_or(ApiErrorResponse::NotFound)
}

/// Commits a mutated task; a task removed in the meantime is not found.
async fn commit_update(state: &AppState, task: &Task) -> Result<(), ApiErrorResponse> {
    if state.task_repository.update(task).await? {
        tracing::debug!(task_id = %task.id, "Task updated");
        Ok(())
    } else {
        Err(ApiErrorResponse::NotFound)
    }
}

// =============================================================================
// Task Handlers
// =============================================================================

/// Lists all tasks.
///
/// # Response
///
/// - **200 OK**: JSON array of tasks, `[]` when there are none
///
/// # Errors
///
/// Returns [`ApiErrorResponse::Internal`] if the repository fails.
pub async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let tasks = state.task_repository.list().await?;
    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

/// Fetches a single task. Also serves `HEAD`.
///
/// # Response
///
/// - **200 OK**: The task
/// - **404 Not Found**: No such task (empty body)
/// - **422 Unprocessable Entity**: Identifier failed validation (empty body)
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] for the failures above or a repository error.
pub async fn get_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let id = match IdentifierForm::new(state.identity_strategy).submit(&raw_id) {
        Submission::Valid(id) => id,
        Submission::Invalid(_) => return Err(ApiErrorResponse::InvalidIdentifier),
    };

    let task = state
        .task_repository
        .find_by_id(&id)
        .await?
        .ok_or(ApiErrorResponse::NotFound)?;

    Ok(Json(TaskResponse::from(&task)))
}

/// Creates a task.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Task title",
///   "description": "Optional description",
///   "deadline": "2021-04-06 17:00",
///   "completed": false
/// }
/// ```
///
/// Under the uuid strategy the body may also carry a `uuid`.
///
/// # Response
///
/// - **201 Created**: Empty body, `Location: /task/{id}`
/// - **400 Bad Request**: Malformed JSON or not an object
/// - **409 Conflict**: The supplied uuid is taken
/// - **422 Unprocessable Entity**: Error document
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] for the failures above or a repository error.
pub async fn create_task(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, [(header::HeaderName, String); 1]), ApiErrorResponse> {
    let payload = parse_payload(&body)?;

    let new_task = match TaskForm::new(TaskFormMode::Create, state.identity_strategy)
        .submit_new(&payload)?
    {
        Submission::Valid(new_task) => new_task,
        Submission::Invalid(form) => return Err(validation_failed(&form)),
    };

    let task = state.task_repository.insert(new_task).await?;
    tracing::debug!(task_id = %task.id, "Task created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location(&task.id))],
    ))
}

/// Applies a partial update.
///
/// Only the supplied fields change; unknown keys are rejected.
///
/// # Response
///
/// - **204 No Content**: Updated
/// - **400 Bad Request**: Malformed JSON or not an object
/// - **404 Not Found**: No such task (empty body)
/// - **422 Unprocessable Entity**: Error document
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] for the failures above or a repository error.
pub async fn patch_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiErrorResponse> {
    submit_changes(&state, &raw_id, &body, TaskFormMode::Patch).await
}

/// Replaces all mutable fields.
///
/// `title`, `description`, `deadline` and `completed` are all required;
/// `description` and `deadline` may be `null`.
///
/// # Response
///
/// - **204 No Content**: Replaced
/// - **400 Bad Request**: Malformed JSON or not an object
/// - **404 Not Found**: No such task (empty body)
/// - **422 Unprocessable Entity**: Error document
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] for the failures above or a repository error.
pub async fn update_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiErrorResponse> {
    submit_changes(&state, &raw_id, &body, TaskFormMode::Replace).await
}

async fn submit_changes(
    state: &AppState,
    raw_id: &str,
    body: &Bytes,
    mode: TaskFormMode,
) -> Result<StatusCode, ApiErrorResponse> {
    let task = load_task(state, raw_id).await?;
    let payload = parse_payload(body)?;

    let changes = match TaskForm::new(mode, state.identity_strategy).submit_changes(&payload)? {
        Submission::Valid(changes) => changes,
        Submission::Invalid(form) => return Err(validation_failed(&form)),
    };

    commit_update(state, &task.apply(changes)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a task.
///
/// # Response
///
/// - **204 No Content**: Deleted
/// - **404 Not Found**: No such task (empty body)
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] for the failures above or a repository error.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiErrorResponse> {
    let id = state
        .identity_strategy
        .parse_id(&raw_id)
        .ok_or(ApiErrorResponse::NotFound)?;

    if state.task_repository.delete(&id).await? {
        tracing::debug!(task_id = %id, "Task deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiErrorResponse::NotFound)
    }
}

fn location(id: &TaskId) -> String {
    format!("/task/{id}")
}

// =============================================================================
// Health Check
// =============================================================================

/// Response for the health check endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check endpoint.
///
/// # Response
///
/// - **200 OK**: Service is healthy
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================
