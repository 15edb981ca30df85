//! Typed form of the migrated documents
//!
//! These types exist on the far side of validation: a `FieldsDocument` or
//! `AnswersDocument` is only ever constructed from an untyped value that the
//! validators in [`super::validate`] accepted. The stored column value is the
//! re-serialization of the typed document, so what lands in the store is
//! exactly what validated.

use super::FieldType;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Validation rules attached to one field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidation {
    pub required: bool,
}

/// One migrated field definition inside an event's fields document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub id: String,

    pub name: String,

    /// Empty string when the legacy row had no description.
    pub description: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Presentation order, from the legacy display rank (0 when absent).
    pub position: i64,

    /// Selectable values, in legacy row order. Empty for non-select fields.
    pub options: Vec<String>,

    pub validation: FieldValidation,
}

/// One migrated answer inside a registration's data document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEntry {
    #[serde(rename = "fieldId")]
    pub field_id: String,

    /// The raw submitted value, untouched.
    pub value: String,

    /// Type of the referenced field definition at migration time.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// Per-event document: field id to field entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldsDocument(pub BTreeMap<String, FieldEntry>);

/// Per-registration document: field id to answer entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswersDocument(pub BTreeMap<String, AnswerEntry>);

impl FieldsDocument {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldEntry> {
        self.0.get(field_id)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl AnswersDocument {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field_id: &str) -> Option<&AnswerEntry> {
        self.0.get(field_id)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> FieldEntry {
        FieldEntry {
            id: "f-1".to_string(),
            name: "Color".to_string(),
            description: String::new(),
            field_type: FieldType::Select,
            position: 3,
            options: vec!["Red".to_string(), "Blue".to_string()],
            validation: FieldValidation { required: true },
        }
    }

    #[test]
    fn test_fields_document_serializes_as_plain_map() {
        let mut doc = FieldsDocument::default();
        doc.0.insert("f-1".to_string(), sample_entry());

        let value = doc.to_value().unwrap();
        let entry = &value["f-1"];

        assert_eq!(entry["type"], "SELECT");
        assert_eq!(entry["position"], 3);
        assert_eq!(entry["options"][1], "Blue");
        assert_eq!(entry["validation"]["required"], true);
    }

    #[test]
    fn test_answer_entry_uses_camel_case_field_id() {
        let entry = AnswerEntry {
            field_id: "f-1".to_string(),
            value: "Red".to_string(),
            field_type: FieldType::Select,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["fieldId"], "f-1");
        assert_eq!(value["type"], "SELECT");
        assert!(value.get("field_id").is_none());
    }
}
