//! regmigrate: one-shot denormalization migration for event-registration data
//!
//! Converts a normalized custom-form layout (field definitions, field
//! options, submitted answers as rows) into per-parent JSON documents:
//! `events.fields` and `registrations.data`. The run validates every
//! produced document against a closed schema, writes the documents, and
//! deletes the legacy tables, all inside one transaction. Any failure rolls
//! the whole run back.
//!
//! Layering:
//! - [`store`] is the transactional handle: an embedded single-file store
//!   with eager-join reads, update-by-id, delete-by-table, commit/rollback.
//! - [`schema`] is the validation facility: untyped value in, typed document
//!   or path-scoped issues out.
//! - [`migrate`] is the engine: extract, transform (the grouping passes),
//!   load/validate, cleanup.

pub mod config;
pub mod error;
pub mod migrate;
pub mod schema;
pub mod store;

pub use config::MigrateConfig;
pub use error::{Error, Result};
pub use migrate::{
    down, up, MigrateOptions, MigrationPhase, MigrationReport, Migrator,
};
pub use schema::{
    validate_answers_document, validate_fields_document, AnswersDocument, EntityKind,
    FieldType, FieldsDocument, ValidationFailure, ValidationIssue,
};
pub use store::{Store, Table, Transaction};
