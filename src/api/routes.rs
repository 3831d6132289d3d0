//! Route configuration for the task API.
//!
//! # Routes
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | /tasks | `list_tasks` | List all tasks |
//! | GET, HEAD | /task/{id} | `get_task` | Fetch one task |
//! | POST | /task | `create_task` | Create a task |
//! | PATCH | /task/{id} | `patch_task` | Change some fields |
//! | PUT | /task/{id} | `update_task` | Replace all mutable fields |
//! | DELETE | /task/{id} | `delete_task` | Delete a task |
//! | GET | /health | `health_check` | Health check endpoint |

use axum::Router;
use axum::routing::{get, post};

use super::handlers::{
    AppState, create_task, delete_task, get_task, health_check, list_tasks, patch_task,
    update_task,
};

/// Creates the router with all API routes bound to `state`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/tasks", get(list_tasks))
        .route("/task", post(create_task))
        .route(
            "/task/{id}",
            get(get_task)
                .patch(patch_task)
                .put(update_task)
                .delete(delete_task),
        )
        .with_state(state)
}
