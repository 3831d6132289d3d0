//! Declarative value constraints.
//!
//! Every constraint except [`Constraint::NotBlank`] accepts `null`: absence
//! is governed by `NotBlank` and by the field's `required` flag, not by the
//! value checks themselves.

use serde_json::Value;
use uuid::Uuid;

use super::form::FormError;
use crate::domain::Deadline;

/// Violation messages.
pub mod messages {
    pub const NOT_BLANK: &str = "This value should not be blank.";
    pub const NOT_VALID: &str = "This value is not valid.";
    pub const MISSING_FIELD: &str = "This field is missing.";
    pub const EXTRA_FIELDS: &str = "This form should not contain extra fields.";
    pub const INVALID_DATETIME: &str = "Please enter a valid date and time.";
    pub const INVALID_UUID: &str = "This is not a valid UUID.";

    /// Message for a value shorter than `min` characters.
    #[must_use]
    pub fn too_short(min: usize) -> String {
        format!("This value is too short. It should have {min} characters or more.")
    }

    /// Message for a value longer than `max` characters.
    #[must_use]
    pub fn too_long(max: usize) -> String {
        format!("This value is too long. It should have {max} characters or less.")
    }

    /// Message for a value of the wrong JSON type.
    #[must_use]
    pub fn wrong_type(expected: &str) -> String {
        format!("This value should be of type {expected}.")
    }

    /// Message for a number not strictly greater than `limit`.
    #[must_use]
    pub fn not_greater_than(limit: i64) -> String {
        format!("This value should be greater than {limit}.")
    }
}

/// A single check applied to a submitted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Not `null`, and not an empty or whitespace-only string.
    NotBlank,
    /// Like [`Constraint::NotBlank`], but `null` passes.
    NotBlankOrNull,
    /// Character count bounds for strings.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Must be a JSON string.
    Text,
    /// Must be a JSON boolean.
    Boolean,
    /// Must be an integer, either as a JSON number or an integer string.
    Integer,
    /// Integer strictly greater than the given limit.
    GreaterThan(i64),
    /// String parseable as a task deadline.
    DateTime,
    /// String parseable as a UUID.
    Uuid,
}

impl Constraint {
    /// Checks a value against this constraint.
    ///
    /// # Errors
    ///
    /// Returns the violation as a [`FormError`].
    pub fn check(&self, value: &Value) -> Result<(), FormError> {
        match (self, value) {
            (Self::NotBlank, Value::Null) => Err(FormError::new(messages::NOT_BLANK)),
            (Self::NotBlank | Self::NotBlankOrNull, Value::String(text))
                if text.trim().is_empty() =>
            {
                Err(FormError::new(messages::NOT_BLANK))
            }
            (_, Value::Null) | (Self::NotBlank | Self::NotBlankOrNull, _) => Ok(()),

            (Self::Length { min, max }, Value::String(text)) => {
                let length = text.chars().count();
                match (min, max) {
                    (Some(min), _) if length < *min => Err(FormError::new(messages::too_short(*min))),
                    (_, Some(max)) if length > *max => Err(FormError::new(messages::too_long(*max))),
                    _ => Ok(()),
                }
            }
            (Self::Length { .. }, _) => Ok(()),

            (Self::Text, Value::String(_)) | (Self::Boolean, Value::Bool(_)) => Ok(()),
            (Self::Text, _) => Err(FormError::new(messages::wrong_type("string"))),
            (Self::Boolean, _) => Err(FormError::new(messages::wrong_type("bool"))),

            (Self::Integer, _) => as_integer(value)
                .map(|_| ())
                .ok_or_else(|| FormError::new(messages::NOT_VALID)),
            (Self::GreaterThan(limit), _) => match as_integer(value) {
                Some(number) if number <= *limit => {
                    Err(FormError::new(messages::not_greater_than(*limit)))
                }
                _ => Ok(()),
            },

            (Self::DateTime, Value::String(text)) => Deadline::parse(text)
                .map(|_| ())
                .ok_or_else(|| FormError::new(messages::INVALID_DATETIME)),
            (Self::DateTime, _) => Err(FormError::new(messages::INVALID_DATETIME)),

            (Self::Uuid, Value::String(text)) => Uuid::parse_str(text.trim())
                .map(|_| ())
                .map_err(|_| FormError::new(messages::INVALID_UUID)),
            (Self::Uuid, _) => Err(FormError::new(messages::INVALID_UUID)),
        }
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
