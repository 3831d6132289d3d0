//! Payload validation.
//!
//! Payloads are submitted to declarative form shapes ([`FormType`]); the
//! outcome is a [`Form`] tree that either passes or is rendered by the
//! [`FormErrorNormalizer`] into an [`ErrorDocument`].

pub mod constraints;
pub mod form;
pub mod normalizer;
pub mod task_form;

pub use constraints::Constraint;
pub use form::{Field, Form, FormError, FormType, MissingFields, ValidationResult};
pub use normalizer::{
    ChildErrors, DEFAULT_TITLE, ErrorChildren, ErrorDocument, ErrorMessage, FormErrorNormalizer,
};
pub use task_form::{IdentifierForm, PayloadError, Submission, TaskForm, TaskFormMode};
