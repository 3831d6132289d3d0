//! Form shapes for task payloads and identifiers.
//!
//! | Shape | Used by | Missing keys |
//! |-------|---------|--------------|
//! | [`TaskFormMode::Create`] | `POST /task` | validated as `null` |
//! | [`TaskFormMode::Replace`] | `PUT /task/{id}` | "This field is missing." |
//! | [`TaskFormMode::Patch`] | `PATCH /task/{id}` | ignored |
//!
//! All three apply the same value constraints, so a partial update can
//! never store a value a create would have rejected.

use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::constraints::Constraint;
use super::form::{Field, Form, FormType, MissingFields, ValidationResult};
use crate::domain::{Deadline, IdentityStrategy, NewTask, TaskChanges, TaskField, TaskId};

const TITLE_MIN_LENGTH: usize = 3;
const TITLE_MAX_LENGTH: usize = 255;
const DESCRIPTION_MIN_LENGTH: usize = 3;

/// Outcome of submitting data to a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    /// The data passed every constraint.
    Valid(T),
    /// At least one constraint failed; the tree describes where.
    Invalid(Form),
}

impl<T> Submission<T> {
    /// Returns `true` for [`Submission::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// The payload could not be submitted at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The JSON document is not an object.
    #[error("Request body must be a JSON object")]
    NotAnObject,
}

// =============================================================================
// Task form
// =============================================================================

/// Which operation a task payload is submitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFormMode {
    Create,
    Replace,
    Patch,
}

/// Form for task payloads.
#[derive(Debug, Clone)]
pub struct TaskForm {
    mode: TaskFormMode,
    strategy: IdentityStrategy,
    form_type: FormType,
}

impl TaskForm {
    /// Builds the form for the given mode and identity strategy.
    ///
    /// Under the uuid strategy the create form also accepts a `uuid` key so
    /// clients can choose the identity of the new task.
    #[must_use]
    pub fn new(mode: TaskFormMode, strategy: IdentityStrategy) -> Self {
        let mut fields: Vec<Field> = TaskField::ALL.into_iter().map(field_for).collect();
        if mode == TaskFormMode::Replace {
            fields = fields.into_iter().map(Field::required).collect();
        }
        if mode == TaskFormMode::Create && strategy == IdentityStrategy::Uuid {
            fields.push(Field::new(
                IdentityStrategy::Uuid.field_name(),
                vec![Constraint::Uuid],
            ));
        }

        Self {
            mode,
            strategy,
            form_type: FormType::new("task", fields),
        }
    }

    /// Validates a create payload and builds the new task.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::NotAnObject`] if `payload` is not a JSON object.
    pub fn submit_new(&self, payload: &Value) -> Result<Submission<NewTask>, PayloadError> {
        let data = as_object(payload)?;
        let form = self.form_type.submit(data, self.missing_fields());
        if !form.is_valid() {
            return Ok(Submission::Invalid(form));
        }

        let changes = extract_changes(data);
        let id = match self.strategy {
            IdentityStrategy::Uuid => data
                .get(IdentityStrategy::Uuid.field_name())
                .and_then(Value::as_str)
                .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
                .map(TaskId::Uuid),
            IdentityStrategy::Sequential => None,
        };

        Ok(Submission::Valid(NewTask {
            id,
            title: changes.title.unwrap_or_default(),
            description: changes.description.flatten(),
            deadline: changes.deadline.flatten(),
            completed: changes.completed.unwrap_or(false),
        }))
    }

    /// Validates a replace or patch payload and returns the field changes.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::NotAnObject`] if `payload` is not a JSON object.
    pub fn submit_changes(&self, payload: &Value) -> Result<Submission<TaskChanges>, PayloadError> {
        let data = as_object(payload)?;
        let form = self.form_type.submit(data, self.missing_fields());
        if !form.is_valid() {
            return Ok(Submission::Invalid(form));
        }
        Ok(Submission::Valid(extract_changes(data)))
    }

    const fn missing_fields(&self) -> MissingFields {
        match self.mode {
            TaskFormMode::Create | TaskFormMode::Replace => MissingFields::Clear,
            TaskFormMode::Patch => MissingFields::Keep,
        }
    }
}

fn field_for(field: TaskField) -> Field {
    let constraints = match field {
        TaskField::Title => vec![
            Constraint::NotBlank,
            Constraint::Text,
            Constraint::Length {
                min: Some(TITLE_MIN_LENGTH),
                max: Some(TITLE_MAX_LENGTH),
            },
        ],
        TaskField::Description => vec![
            Constraint::Text,
            Constraint::NotBlankOrNull,
            Constraint::Length {
                min: Some(DESCRIPTION_MIN_LENGTH),
                max: None,
            },
        ],
        TaskField::Deadline => vec![
            Constraint::Text,
            Constraint::NotBlankOrNull,
            Constraint::DateTime,
        ],
        TaskField::Completed => vec![Constraint::Boolean],
    };
    Field::new(field.name(), constraints)
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, PayloadError> {
    payload.as_object().ok_or(PayloadError::NotAnObject)
}

/// Reads the allow-listed fields of an already validated payload.
fn extract_changes(data: &Map<String, Value>) -> TaskChanges {
    let mut changes = TaskChanges::default();
    for (key, value) in data {
        match TaskField::from_name(key) {
            Some(TaskField::Title) => {
                changes.title = value.as_str().map(str::to_string);
            }
            Some(TaskField::Description) => {
                changes.description = Some(value.as_str().map(str::to_string));
            }
            Some(TaskField::Deadline) => {
                changes.deadline = Some(value.as_str().and_then(Deadline::parse));
            }
            Some(TaskField::Completed) => {
                changes.completed = value.as_bool();
            }
            None => {}
        }
    }
    changes
}

// =============================================================================
// Identifier form
// =============================================================================

/// Form validating a task identifier taken from the request path.
#[derive(Debug, Clone)]
pub struct IdentifierForm {
    strategy: IdentityStrategy,
    form_type: FormType,
}

impl IdentifierForm {
    /// Builds the identifier form for the given strategy.
    ///
    /// Sequential identifiers must be integers greater than zero; uuid
    /// identifiers must parse as UUIDs.
    #[must_use]
    pub fn new(strategy: IdentityStrategy) -> Self {
        let constraints = match strategy {
            IdentityStrategy::Sequential => vec![
                Constraint::NotBlank,
                Constraint::Integer,
                Constraint::GreaterThan(0),
            ],
            IdentityStrategy::Uuid => vec![Constraint::NotBlank, Constraint::Uuid],
        };

        Self {
            strategy,
            form_type: FormType::new(
                "identifier",
                vec![Field::new("id", constraints).required()],
            ),
        }
    }

    /// Validates a raw identifier.
    #[must_use]
    pub fn submit(&self, raw: &str) -> Submission<TaskId> {
        let mut data = Map::new();
        data.insert("id".to_string(), Value::String(raw.to_string()));

        let form = self.form_type.submit(&data, MissingFields::Clear);
        if !form.is_valid() {
            return Submission::Invalid(form);
        }

        self.strategy
            .parse_id(raw)
            .map_or(Submission::Invalid(form), Submission::Valid)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FormErrorNormalizer;
    use rstest::rstest;
    use serde_json::json;

    fn first_error(form: &Form, field: &str) -> Option<String> {
        form.child(field)
            .and_then(|child| child.errors().first())
            .map(|error| error.message().to_string())
    }

    fn invalid<T: std::fmt::Debug>(submission: Submission<T>) -> Form {
        match submission {
            Submission::Invalid(form) => form,
            Submission::Valid(value) => panic!("expected invalid submission, got {value:?}"),
        }
    }

    fn valid<T>(submission: Submission<T>) -> T {
        match submission {
            Submission::Valid(value) => value,
            Submission::Invalid(form) => panic!(
                "expected valid submission, got {:?}",
                FormErrorNormalizer.normalize(&form)
            ),
        }
    }

    fn create_form() -> TaskForm {
        TaskForm::new(TaskFormMode::Create, IdentityStrategy::Sequential)
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_create_valid_payload() {
        let payload = json!({
            "title": "TestMe",
            "description": "MyDescription",
            "deadline": "2021-04-06 17:00",
            "completed": false,
        });

        let task = valid(create_form().submit_new(&payload).unwrap());

        assert_eq!(task.id, None);
        assert_eq!(task.title, "TestMe");
        assert_eq!(task.description.as_deref(), Some("MyDescription"));
        assert_eq!(
            task.deadline.map(|deadline| deadline.to_string()).as_deref(),
            Some("2021-04-06 17:00")
        );
        assert!(!task.completed);
    }

    #[rstest]
    fn test_create_title_only_uses_defaults() {
        let task = valid(create_form().submit_new(&json!({ "title": "Another" })).unwrap());
        assert!(task.description.is_none());
        assert!(task.deadline.is_none());
        assert!(!task.completed);
    }

    #[rstest]
    #[case("ab", false)]
    #[case("abc", true)]
    fn test_create_title_length_boundary(#[case] title: &str, #[case] accepted: bool) {
        let submission = create_form().submit_new(&json!({ "title": title })).unwrap();
        assert_eq!(submission.is_valid(), accepted);
    }

    #[rstest]
    fn test_create_title_max_length_boundary() {
        let form = create_form();
        assert!(
            form.submit_new(&json!({ "title": "a".repeat(255) }))
                .unwrap()
                .is_valid()
        );
        let rejected = invalid(form.submit_new(&json!({ "title": "a".repeat(256) })).unwrap());
        assert_eq!(
            first_error(&rejected, "title").as_deref(),
            Some("This value is too long. It should have 255 characters or less.")
        );
    }

    #[rstest]
    #[case("ab ", "ab ")]
    #[case("  Padded  ", "  Padded  ")]
    fn test_create_stores_title_as_validated(#[case] title: &str, #[case] stored: &str) {
        let task = valid(create_form().submit_new(&json!({ "title": title })).unwrap());
        assert_eq!(task.title, stored);
    }

    #[rstest]
    fn test_create_missing_title_is_blank() {
        let form = invalid(create_form().submit_new(&json!({})).unwrap());
        assert_eq!(
            first_error(&form, "title").as_deref(),
            Some("This value should not be blank.")
        );
    }

    #[rstest]
    #[case(json!({ "title": "Title", "description": "ab" }), "description", "This value is too short. It should have 3 characters or more.")]
    #[case(json!({ "title": "Title", "deadline": "someday" }), "deadline", "Please enter a valid date and time.")]
    #[case(json!({ "title": "Title", "completed": "yes" }), "completed", "This value should be of type bool.")]
    #[case(json!({ "title": 42 }), "title", "This value should be of type string.")]
    #[case(json!({ "title": "Title", "description": "  " }), "description", "This value should not be blank.")]
    fn test_create_field_violations(
        #[case] payload: Value,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let form = invalid(create_form().submit_new(&payload).unwrap());
        assert_eq!(first_error(&form, field).as_deref(), Some(message));
    }

    #[rstest]
    fn test_create_rejects_extra_fields() {
        let form = invalid(
            create_form()
                .submit_new(&json!({ "title": "Title", "priority": "high" }))
                .unwrap(),
        );
        assert_eq!(
            form.errors()[0].message(),
            "This form should not contain extra fields."
        );
    }

    #[rstest]
    fn test_create_sequential_rejects_client_identity() {
        let submission = create_form()
            .submit_new(&json!({ "title": "Title", "id": 5 }))
            .unwrap();
        assert!(!submission.is_valid());
    }

    #[rstest]
    fn test_create_uuid_accepts_client_identity() {
        let uuid = Uuid::new_v4();
        let form = TaskForm::new(TaskFormMode::Create, IdentityStrategy::Uuid);

        let task = valid(
            form.submit_new(&json!({ "title": "Title", "uuid": uuid.to_string() }))
                .unwrap(),
        );
        assert_eq!(task.id, Some(TaskId::Uuid(uuid)));

        let rejected = invalid(form.submit_new(&json!({ "title": "Title", "uuid": "nope" })).unwrap());
        assert_eq!(
            first_error(&rejected, "uuid").as_deref(),
            Some("This is not a valid UUID.")
        );
    }

    #[rstest]
    fn test_create_rejects_non_object_payload() {
        assert_eq!(
            create_form().submit_new(&json!(["title"])),
            Err(PayloadError::NotAnObject)
        );
    }

    // -------------------------------------------------------------------------
    // Replace
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_replace_requires_all_fields() {
        let form = TaskForm::new(TaskFormMode::Replace, IdentityStrategy::Sequential);
        let tree = invalid(form.submit_changes(&json!({ "title": "Title" })).unwrap());

        assert!(first_error(&tree, "title").is_none());
        for field in ["description", "deadline", "completed"] {
            assert_eq!(
                first_error(&tree, field).as_deref(),
                Some("This field is missing."),
                "{field}"
            );
        }
    }

    #[rstest]
    fn test_replace_accepts_explicit_nulls() {
        let form = TaskForm::new(TaskFormMode::Replace, IdentityStrategy::Uuid);
        let changes = valid(
            form.submit_changes(&json!({
                "title": "Title",
                "description": null,
                "deadline": null,
                "completed": true,
            }))
            .unwrap(),
        );

        assert_eq!(changes.title.as_deref(), Some("Title"));
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.deadline, Some(None));
        assert_eq!(changes.completed, Some(true));
    }

    #[rstest]
    #[case(json!({ "title": "ab", "description": null, "deadline": null, "completed": true }), "title", "This value is too short. It should have 3 characters or more.")]
    #[case(json!({ "title": "Title", "description": null, "deadline": "someday", "completed": true }), "deadline", "Please enter a valid date and time.")]
    #[case(json!({ "title": "Title", "description": null, "deadline": null, "completed": "yes" }), "completed", "This value should be of type bool.")]
    #[case(json!({ "title": "Title", "description": "  ", "deadline": null, "completed": true }), "description", "This value should not be blank.")]
    fn test_replace_field_violations(
        #[case] payload: Value,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let form = TaskForm::new(TaskFormMode::Replace, IdentityStrategy::Sequential);
        let tree = invalid(form.submit_changes(&payload).unwrap());
        assert_eq!(first_error(&tree, field).as_deref(), Some(message));
    }

    #[rstest]
    fn test_replace_keeps_title_padding() {
        let form = TaskForm::new(TaskFormMode::Replace, IdentityStrategy::Sequential);
        let changes = valid(
            form.submit_changes(&json!({
                "title": "  Padded  ",
                "description": null,
                "deadline": null,
                "completed": false,
            }))
            .unwrap(),
        );
        assert_eq!(changes.title.as_deref(), Some("  Padded  "));
    }

    #[rstest]
    fn test_replace_rejects_identity_change() {
        let form = TaskForm::new(TaskFormMode::Replace, IdentityStrategy::Uuid);
        let submission = form
            .submit_changes(&json!({
                "uuid": Uuid::new_v4().to_string(),
                "title": "Title",
                "description": null,
                "deadline": null,
                "completed": true,
            }))
            .unwrap();
        assert!(!submission.is_valid());
    }

    // -------------------------------------------------------------------------
    // Patch
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_patch_only_reports_supplied_fields() {
        let form = TaskForm::new(TaskFormMode::Patch, IdentityStrategy::Sequential);
        let changes = valid(form.submit_changes(&json!({ "title": "New Title" })).unwrap());

        assert_eq!(changes.fields(), vec![TaskField::Title]);
        assert_eq!(changes.title.as_deref(), Some("New Title"));
    }

    #[rstest]
    fn test_patch_validates_supplied_values() {
        let form = TaskForm::new(TaskFormMode::Patch, IdentityStrategy::Sequential);
        let tree = invalid(form.submit_changes(&json!({ "title": "ab" })).unwrap());
        assert!(first_error(&tree, "title").is_some());
        assert!(first_error(&tree, "description").is_none());
    }

    #[rstest]
    fn test_patch_rejects_unknown_keys() {
        let form = TaskForm::new(TaskFormMode::Patch, IdentityStrategy::Sequential);
        let tree = invalid(
            form.submit_changes(&json!({ "title": "Valid", "owner": "me" }))
                .unwrap(),
        );
        assert_eq!(
            tree.errors()[0].message(),
            "This form should not contain extra fields."
        );
    }

    #[rstest]
    fn test_patch_parses_deadline() {
        let form = TaskForm::new(TaskFormMode::Patch, IdentityStrategy::Sequential);
        let changes = valid(
            form.submit_changes(&json!({ "deadline": "2021-05-05 16:00" }))
                .unwrap(),
        );
        assert_eq!(
            changes
                .deadline
                .flatten()
                .map(|deadline| deadline.to_string())
                .as_deref(),
            Some("2021-05-05 16:00")
        );
    }

    // -------------------------------------------------------------------------
    // Identifier
    // -------------------------------------------------------------------------

    #[rstest]
    #[case("1", true)]
    #[case("250", true)]
    #[case("0", false)]
    #[case("-1", false)]
    #[case("abc", false)]
    #[case("1.5", false)]
    fn test_identifier_sequential(#[case] raw: &str, #[case] accepted: bool) {
        let submission = IdentifierForm::new(IdentityStrategy::Sequential).submit(raw);
        assert_eq!(submission.is_valid(), accepted);
    }

    #[rstest]
    fn test_identifier_sequential_messages() {
        let form = IdentifierForm::new(IdentityStrategy::Sequential);
        assert_eq!(
            first_error(&invalid(form.submit("0")), "id").as_deref(),
            Some("This value should be greater than 0.")
        );
        assert_eq!(
            first_error(&invalid(form.submit("abc")), "id").as_deref(),
            Some("This value is not valid.")
        );
    }

    #[rstest]
    fn test_identifier_uuid() {
        let form = IdentifierForm::new(IdentityStrategy::Uuid);
        let uuid = Uuid::new_v4();
        assert_eq!(form.submit(&uuid.to_string()), Submission::Valid(TaskId::Uuid(uuid)));
        assert!(!form.submit("12").is_valid());
    }
}
