//! Document schemas for the denormalized registration format
//!
//! The migration produces two JSON document shapes: a per-event fields
//! document and a per-registration answers document. This module holds the
//! typed form of both, plus the validators that turn an untyped
//! `serde_json::Value` into the typed form or report what is wrong with it,
//! issue by issue, with a path into the document.

pub mod documents;
pub mod field_type;
pub mod validate;

pub use documents::{AnswerEntry, AnswersDocument, FieldEntry, FieldValidation, FieldsDocument};
pub use field_type::FieldType;
pub use validate::{validate_answers_document, validate_fields_document, ValidationIssue};

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which kind of owning row a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Event,
    Registration,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Event => write!(f, "event"),
            EntityKind::Registration => write!(f, "registration"),
        }
    }
}

/// A document that failed schema validation, with the owning entity and the
/// full list of path-scoped issues.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{entity} {id}: document failed validation ({n} issue(s))", n = .issues.len())]
pub struct ValidationFailure {
    pub entity: EntityKind,
    pub id: String,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationFailure {
    pub fn new(entity: EntityKind, id: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        Self {
            entity,
            id: id.into(),
            issues,
        }
    }
}
