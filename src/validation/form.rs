//! Form trees produced by submitting a payload to a form shape.
//!
//! A [`Form`] mirrors the shape of the submitted data: it carries its own
//! flat error list plus one named child per declared field. Field errors
//! live on the children, payload-wide errors (e.g. extra fields) on the
//! root.

use serde_json::{Map, Value};

use super::constraints::{Constraint, messages};

// =============================================================================
// Validation Result
// =============================================================================

/// A single validation error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    message: String,
}

impl FormError {
    /// Creates a new error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Read access to a (possibly nested) validation outcome.
///
/// This is everything the error normalizer needs; any structure exposing
/// a name, submission/validity flags, flat errors and named children can
/// be rendered as an error document.
pub trait ValidationResult: Sized {
    /// Name of this node (the field name for children).
    fn name(&self) -> &str;

    /// Whether data has been submitted to this node.
    fn is_submitted(&self) -> bool;

    /// Whether this node and all of its children are free of errors.
    fn is_valid(&self) -> bool;

    /// Errors attached directly to this node, in insertion order.
    fn errors(&self) -> &[FormError];

    /// Named children, in declaration order.
    fn children(&self) -> &[Self];
}

/// Concrete validation tree built by [`FormType::submit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    name: String,
    submitted: bool,
    errors: Vec<FormError>,
    children: Vec<Form>,
}

impl Form {
    /// Creates an empty, unsubmitted form node.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attaches an error to this node.
    pub fn add_error(&mut self, error: FormError) {
        self.errors.push(error);
    }

    /// Appends a named child.
    pub fn add_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Returns the child with the given name, if any.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Marks this node and all of its children as submitted.
    pub fn mark_submitted(&mut self) {
        self.submitted = true;
        for child in &mut self.children {
            child.mark_submitted();
        }
    }
}

impl ValidationResult for Form {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_submitted(&self) -> bool {
        self.submitted
    }

    fn is_valid(&self) -> bool {
        self.submitted
            && self.errors.is_empty()
            && self.children.iter().all(ValidationResult::is_valid)
    }

    fn errors(&self) -> &[FormError] {
        &self.errors
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

// =============================================================================
// Form Type
// =============================================================================

/// A declared field: its name, whether the key must be present, and the
/// constraints its value is checked against.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    required: bool,
    constraints: Vec<Constraint>,
}

impl Field {
    /// Declares an optional field.
    #[must_use]
    pub const fn new(name: &'static str, constraints: Vec<Constraint>) -> Self {
        Self {
            name,
            required: false,
            constraints,
        }
    }

    /// Marks the field as required: a missing key is an error.
    #[must_use]
    pub fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Validates a single value and returns the child node for this field.
    ///
    /// Stops at the first violated constraint.
    #[must_use]
    pub fn validate(&self, value: &Value) -> Form {
        let mut form = Form::new(self.name);
        if let Some(error) = self
            .constraints
            .iter()
            .find_map(|constraint| constraint.check(value).err())
        {
            form.add_error(error);
        }
        form
    }
}

/// How keys missing from the payload are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFields {
    /// Missing keys are validated as `null` (full submission).
    Clear,
    /// Missing keys are left alone (partial submission).
    Keep,
}

/// A declarative form: an ordered list of fields.
#[derive(Debug, Clone)]
pub struct FormType {
    name: &'static str,
    fields: Vec<Field>,
}

impl FormType {
    /// Creates a form type from its fields.
    #[must_use]
    pub const fn new(name: &'static str, fields: Vec<Field>) -> Self {
        Self { name, fields }
    }

    /// Returns the declared field names, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(Field::name)
    }

    /// Submits a JSON object and returns the resulting validation tree.
    ///
    /// Keys that are not declared fields produce a single error on the
    /// root node.
    #[must_use]
    pub fn submit(&self, data: &Map<String, Value>, missing: MissingFields) -> Form {
        let mut form = Form::new(self.name);

        for field in &self.fields {
            let child = match data.get(field.name) {
                Some(value) => field.validate(value),
                None if field.required => {
                    let mut child = Form::new(field.name);
                    child.add_error(FormError::new(messages::MISSING_FIELD));
                    child
                }
                None if missing == MissingFields::Clear => field.validate(&Value::Null),
                None => Form::new(field.name),
            };
            form.add_child(child);
        }

        let has_extra_fields = data
            .keys()
            .any(|key| !self.fields.iter().any(|field| field.name == key.as_str()));
        if has_extra_fields {
            form.add_error(FormError::new(messages::EXTRA_FIELDS));
        }

        form.mark_submitted();
        form
    }
}

// =============================================================================
// Tests
// =============================================================================
