//! Domain module for task management.
//!
//! This module contains the task entity, its value objects, and the
//! identity strategy shared by every storage backend.

pub mod task;

pub use task::{
    Deadline, IdentityStrategy, NewTask, Task, TaskChanges, TaskField, TaskId,
    UnknownIdentityStrategy,
};
