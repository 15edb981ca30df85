//! Row types and the in-memory table set
//!
//! Rows mirror the relational layout the migration consumes and produces:
//! `events` and `registrations` are the surviving parents (each with a JSON
//! document column), the three `registration_*` tables are the legacy
//! normalized layout that is deleted on success.
//!
//! Tables are plain row vectors: the dataset is a bounded legacy set read in
//! one pass, and keeping heap order preserves the original row order for
//! things like option values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifies one of the five tables the migration touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Table {
    Events,
    Registrations,
    RegistrationFields,
    RegistrationFieldOptions,
    RegistrationData,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Events => "events",
            Table::Registrations => "registrations",
            Table::RegistrationFields => "registration_fields",
            Table::RegistrationFieldOptions => "registration_field_options",
            Table::RegistrationData => "registration_data",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_document() -> Value {
    Value::Object(serde_json::Map::new())
}

/// An event, the parent entity owning field definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub event_display_rank: Option<i64>,
    /// Fields document column; `{}` until the migration fills it.
    #[serde(default = "default_document")]
    pub fields: Value,
}

/// A registration of one user for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRow {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    /// Answers document column; `{}` until the migration fills it.
    #[serde(default = "default_document")]
    pub data: Value,
}

/// Legacy: one custom form field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationFieldRow {
    pub id: String,
    pub event_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw type tag as stored; validated only when it enters a document.
    pub field_type: String,
    #[serde(default)]
    pub field_display_rank: Option<i64>,
    #[serde(default)]
    pub required: bool,
    /// Legacy-only column, destroyed with the table.
    #[serde(default)]
    pub for_user: bool,
    /// Legacy-only column, destroyed with the table.
    #[serde(default)]
    pub character_limit: Option<i64>,
}

/// Legacy: one selectable value of a SELECT field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationFieldOptionRow {
    pub id: String,
    pub registration_field_id: String,
    pub value: String,
}

/// Legacy: one submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationDataRow {
    pub id: String,
    /// Nullable in the legacy layout; rows without an owner are orphans.
    #[serde(default)]
    pub registration_id: Option<String>,
    #[serde(default)]
    pub registration_field_id: Option<String>,
    pub value: String,
}

/// A field definition with its option rows eagerly attached.
#[derive(Debug, Clone)]
pub struct FieldWithOptions {
    pub row: RegistrationFieldRow,
    pub options: Vec<RegistrationFieldOptionRow>,
}

/// An answer row with its referenced field definition eagerly joined.
/// `field` is None when the reference is broken or absent.
#[derive(Debug, Clone)]
pub struct AnswerWithField {
    pub row: RegistrationDataRow,
    pub field: Option<RegistrationFieldRow>,
}

/// The full set of tables, cloned wholesale for transaction isolation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
    pub events: Vec<EventRow>,
    pub registrations: Vec<RegistrationRow>,
    pub registration_fields: Vec<RegistrationFieldRow>,
    pub registration_field_options: Vec<RegistrationFieldOptionRow>,
    pub registration_data: Vec<RegistrationDataRow>,
}

impl TableSet {
    pub fn row_count(&self, table: Table) -> usize {
        match table {
            Table::Events => self.events.len(),
            Table::Registrations => self.registrations.len(),
            Table::RegistrationFields => self.registration_fields.len(),
            Table::RegistrationFieldOptions => self.registration_field_options.len(),
            Table::RegistrationData => self.registration_data.len(),
        }
    }

    pub fn clear_table(&mut self, table: Table) -> usize {
        let removed = self.row_count(table);
        match table {
            Table::Events => self.events.clear(),
            Table::Registrations => self.registrations.clear(),
            Table::RegistrationFields => self.registration_fields.clear(),
            Table::RegistrationFieldOptions => self.registration_field_options.clear(),
            Table::RegistrationData => self.registration_data.clear(),
        }
        removed
    }
}
