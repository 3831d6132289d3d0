//! Task domain model.
//!
//! A task is a to-do record with a title, an optional description, an
//! optional deadline and a completion flag. Its identity is either a
//! store-assigned integer or a UUID, depending on the [`IdentityStrategy`]
//! the system was started with.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Identity
// =============================================================================

/// How task identifiers are assigned and represented.
///
/// Exactly one strategy is active for a running system. `Sequential` matches
/// the first schema generation (auto-increment integer key), `Uuid` the
/// second one (UUID primary key supplied by the client or generated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdentityStrategy {
    /// Positive integers assigned by the store in insertion order.
    Sequential,
    /// 128-bit UUIDs, supplied by the client at creation time or generated.
    #[default]
    Uuid,
}

/// Error returned when an identity strategy name is not recognized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid identity strategy: '{0}'. Expected 'sequential' or 'uuid'")]
pub struct UnknownIdentityStrategy(pub String);

impl IdentityStrategy {
    /// Returns the key under which the identity is exposed in the API.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Sequential => "id",
            Self::Uuid => "uuid",
        }
    }

    /// Parses a raw identifier (typically a path segment) for this strategy.
    ///
    /// Returns `None` when the value is not a positive integer (sequential)
    /// or not a valid UUID (uuid).
    #[must_use]
    pub fn parse_id(self, raw: &str) -> Option<TaskId> {
        let raw = raw.trim();
        match self {
            Self::Sequential => raw
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .map(TaskId::Sequential),
            Self::Uuid => Uuid::parse_str(raw).ok().map(TaskId::Uuid),
        }
    }
}

impl FromStr for IdentityStrategy {
    type Err = UnknownIdentityStrategy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "sequential" | "integer" | "int" => Ok(Self::Sequential),
            "uuid" => Ok(Self::Uuid),
            _ => Err(UnknownIdentityStrategy(value.to_string())),
        }
    }
}

impl std::fmt::Display for IdentityStrategy {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(formatter, "sequential"),
            Self::Uuid => write!(formatter, "uuid"),
        }
    }
}

/// Unique identifier for a task.
///
/// Serialized as a single-entry map keyed by the strategy's field name
/// (`{"id": 7}` or `{"uuid": "..."}`), which lets response DTOs flatten it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskId {
    /// Store-assigned positive integer.
    #[serde(rename = "id")]
    Sequential(u64),
    /// Client-supplied or generated UUID.
    #[serde(rename = "uuid")]
    Uuid(Uuid),
}

impl TaskId {
    /// Generates a new time-ordered UUID identifier (v7).
    ///
    /// **Note**: This is an impure function (side effect: time + random).
    #[must_use]
    pub fn generate_v7() -> Self {
        Self::Uuid(Uuid::now_v7())
    }

    /// Returns the strategy this identifier belongs to.
    #[must_use]
    pub const fn strategy(&self) -> IdentityStrategy {
        match self {
            Self::Sequential(_) => IdentityStrategy::Sequential,
            Self::Uuid(_) => IdentityStrategy::Uuid,
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential(value) => write!(formatter, "{value}"),
            Self::Uuid(value) => write!(formatter, "{value}"),
        }
    }
}

// =============================================================================
// Deadline
// =============================================================================

/// A task deadline with minute precision and no timezone component.
///
/// Rendered as `YYYY-MM-DD HH:MM`. Seconds and sub-second parts of any
/// input are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(NaiveDateTime);

/// Naive date-time layouts accepted at the API boundary.
const DATETIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

impl Deadline {
    /// Output layout used for rendering and storage round-trips.
    pub const FORMAT: &'static str = "%Y-%m-%d %H:%M";

    /// Creates a deadline from a naive date-time, truncating to the minute.
    #[must_use]
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        let truncated = datetime
            .with_second(0)
            .and_then(|value| value.with_nanosecond(0))
            .unwrap_or(datetime);
        Self(truncated)
    }

    /// Parses a deadline from user input.
    ///
    /// Accepts `YYYY-MM-DD HH:MM[:SS]`, the same with a `T` separator, and a
    /// bare `YYYY-MM-DD` (midnight). Inputs carrying a UTC offset or
    /// fractional seconds are rejected. Returns `None` for anything else.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        DATETIME_INPUT_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(input, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(Self::from_datetime)
    }

    /// Returns the inner naive date-time.
    #[must_use]
    pub const fn as_datetime(&self) -> &NaiveDateTime {
        &self.0
    }
}

impl std::fmt::Display for Deadline {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.format(Self::FORMAT))
    }
}

impl Serialize for Deadline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Deadline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid deadline: {raw}")))
    }
}

// =============================================================================
// Task
// =============================================================================

/// The task entity.
///
/// # Examples
///
/// ```
/// use task_api::domain::{Deadline, Task, TaskId};
///
/// let task = Task::new(TaskId::Sequential(1), "Title")
///     .with_description("Description")
///     .with_deadline(Deadline::parse("2021-05-05 16:00"))
///     .with_completed(true);
///
/// assert_eq!(task.deadline.map(|deadline| deadline.to_string()).as_deref(), Some("2021-05-05 16:00"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Immutable identity.
    pub id: TaskId,
    /// Title, 3 to 255 characters.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Optional deadline.
    pub deadline: Option<Deadline>,
    /// Completion flag.
    pub completed: bool,
}

impl Task {
    /// Creates an open task with no description and no deadline.
    #[must_use]
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            deadline: None,
            completed: false,
        }
    }

    /// Returns the task with the given title.
    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    /// Returns the task with the given description.
    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    /// Returns the task with the description removed.
    #[must_use]
    pub fn without_description(self) -> Self {
        Self {
            description: None,
            ..self
        }
    }

    /// Returns the task with the given deadline (`None` clears it).
    #[must_use]
    pub fn with_deadline(self, deadline: Option<Deadline>) -> Self {
        Self { deadline, ..self }
    }

    /// Returns the task with the completion flag set to the given value.
    #[must_use]
    pub fn with_completed(self, completed: bool) -> Self {
        Self { completed, ..self }
    }

    /// Applies a set of field changes, leaving unspecified fields untouched.
    ///
    /// The identity is never part of a change set.
    #[must_use]
    pub fn apply(self, changes: TaskChanges) -> Self {
        let TaskChanges {
            title,
            description,
            deadline,
            completed,
        } = changes;

        Self {
            id: self.id,
            title: title.unwrap_or(self.title),
            description: description.unwrap_or(self.description),
            deadline: deadline.unwrap_or(self.deadline),
            completed: completed.unwrap_or(self.completed),
        }
    }
}

/// A task that has not been persisted yet.
///
/// `id` is `None` when the store (sequential) or the repository (uuid) is
/// expected to assign the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub id: Option<TaskId>,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<Deadline>,
    pub completed: bool,
}

impl NewTask {
    /// Creates a new task draft with only a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            deadline: None,
            completed: false,
        }
    }

    /// Binds the draft to its final identity.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            deadline: self.deadline,
            completed: self.completed,
        }
    }
}

// =============================================================================
// Mutable fields
// =============================================================================

/// Allow-list of the fields a client may change after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Title,
    Description,
    Deadline,
    Completed,
}

impl TaskField {
    /// Every mutable field, in canonical order.
    pub const ALL: [Self; 4] = [
        Self::Title,
        Self::Description,
        Self::Deadline,
        Self::Completed,
    ];

    /// Returns the payload key for this field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Deadline => "deadline",
            Self::Completed => "completed",
        }
    }

    /// Looks up a field by its payload key. Unknown keys yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

/// A set of changes to apply to a task.
///
/// The outer `Option` tells whether the field is changed at all; for
/// nullable fields the inner `Option` carries the new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub deadline: Option<Option<Deadline>>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    /// Returns `true` if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.deadline.is_none()
            && self.completed.is_none()
    }

    /// Lists the fields touched by this change set.
    #[must_use]
    pub fn fields(&self) -> Vec<TaskField> {
        TaskField::ALL
            .into_iter()
            .filter(|field| match field {
                TaskField::Title => self.title.is_some(),
                TaskField::Description => self.description.is_some(),
                TaskField::Deadline => self.deadline.is_some(),
                TaskField::Completed => self.completed.is_some(),
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
