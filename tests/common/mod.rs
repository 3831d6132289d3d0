//! Common test helpers for integration tests.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::{create_test_app_state, create_and_save_task};
//! ```
//!
//! Each integration test file is compiled as its own crate, so helpers used
//! by only one of them would otherwise warn as dead code.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use task_api::api::{AppState, create_router};
use task_api::domain::{Deadline, IdentityStrategy, NewTask, Task};
use task_api::infrastructure::InMemoryTaskRepository;

// =============================================================================
// AppState Creation Helpers
// =============================================================================

/// Creates an `AppState` over an empty in-memory repository.
pub fn create_test_app_state(strategy: IdentityStrategy) -> AppState {
    AppState::new(Arc::new(InMemoryTaskRepository::new(strategy)))
}

/// Creates the full router over the given state.
pub fn create_test_router(state: &AppState) -> Router {
    create_router(state.clone())
}

// =============================================================================
// Task Fixtures
// =============================================================================

/// Saves a task with only a title.
pub async fn create_and_save_task(state: &AppState, title: &str) -> Task {
    state
        .task_repository
        .insert(NewTask::new(title))
        .await
        .expect("Failed to save task")
}

/// Saves a task with every field populated.
pub async fn create_full_task(state: &AppState) -> Task {
    let mut new_task = NewTask::new("Full Task");
    new_task.description = Some("Full description".to_string());
    new_task.deadline = Deadline::parse("2021-05-05 16:00");
    new_task.completed = true;

    state
        .task_repository
        .insert(new_task)
        .await
        .expect("Failed to save task")
}

/// Reads a stored task back from the repository.
pub async fn reload(state: &AppState, task: &Task) -> Option<Task> {
    state
        .task_repository
        .find_by_id(&task.id)
        .await
        .expect("Failed to load task")
}

// =============================================================================
// HTTP Helpers
// =============================================================================

/// Sends a request through the router.
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<&str>) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
        .expect("Failed to build request");

    router
        .clone()
        .oneshot(request)
        .await
        .expect("Router is infallible")
}

/// Collects a response body.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
}

/// Collects a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}
