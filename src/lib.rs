//! Task API Library
//!
//! A REST API managing to-do tasks: a title, an optional description, an
//! optional deadline and a completion flag. Payloads are validated with
//! declarative forms and failures are rendered as JSON error documents.
//! Tasks are stored in memory or in `PostgreSQL`, keyed by sequential
//! integers or UUIDs depending on the configured identity strategy.

pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod validation;
