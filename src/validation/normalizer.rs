//! Rendering of failed validation results as JSON error documents.
//!
//! # Document shape
//!
//! ```json
//! {
//!   "title": "Validation Failed",
//!   "errors": [{ "message": "This form should not contain extra fields." }],
//!   "children": {
//!     "title": { "errors": [{ "message": "This value should not be blank." }] },
//!     "description": { "errors": [] }
//!   }
//! }
//! ```
//!
//! `children` is present only for nodes that have named children, at every
//! level. Child entries keep the iteration order of the validation result.

use indexmap::IndexMap;
use serde::Serialize;

use super::form::ValidationResult;

/// Title used when the caller does not supply one.
pub const DEFAULT_TITLE: &str = "Validation Failed";

/// One rendered error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// Errors of a named child, with its own children when it has any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildErrors {
    pub errors: Vec<ErrorMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<ErrorChildren>,
}

/// Child name to rendered errors, in the iteration order of the result.
pub type ErrorChildren = IndexMap<String, ChildErrors>;

/// The JSON error document returned for failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDocument {
    pub title: String,
    pub errors: Vec<ErrorMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<ErrorChildren>,
}

/// Converts failed validation results into [`ErrorDocument`]s.
///
/// Stateless; the transform has no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormErrorNormalizer;

impl FormErrorNormalizer {
    /// Returns `true` for results that were submitted and are invalid.
    #[must_use]
    pub fn supports<R: ValidationResult>(&self, result: &R) -> bool {
        result.is_submitted() && !result.is_valid()
    }

    /// Renders a result with the default title.
    #[must_use]
    pub fn normalize<R: ValidationResult>(&self, result: &R) -> ErrorDocument {
        self.normalize_with_title(result, None)
    }

    /// Renders a result, using `title` instead of the default when given.
    #[must_use]
    pub fn normalize_with_title<R: ValidationResult>(
        &self,
        result: &R,
        title: Option<&str>,
    ) -> ErrorDocument {
        ErrorDocument {
            title: title.unwrap_or(DEFAULT_TITLE).to_string(),
            errors: convert_errors(result),
            children: convert_children(result),
        }
    }
}

fn convert_errors<R: ValidationResult>(result: &R) -> Vec<ErrorMessage> {
    result
        .errors()
        .iter()
        .map(|error| ErrorMessage {
            message: error.message().to_string(),
        })
        .collect()
}

fn convert_children<R: ValidationResult>(result: &R) -> Option<ErrorChildren> {
    if result.children().is_empty() {
        return None;
    }

    let children = result
        .children()
        .iter()
        .map(|child| {
            let errors = ChildErrors {
                errors: convert_errors(child),
                children: convert_children(child),
            };
            (child.name().to_string(), errors)
        })
        .collect();

    Some(children)
}

// =============================================================================
// Tests
// =============================================================================
