//! Structural validation of untyped documents
//!
//! The validators walk a `serde_json::Value` by hand and collect every
//! problem they find instead of stopping at the first one. Each issue carries
//! a path into the document ("<field-id>.position", "<field-id>.validation
//! .required") so a failed migration run names exactly which entry of which
//! document was malformed.
//!
//! Key sets are closed: a key outside the schema is an issue, not ignored.

use super::documents::{
    AnswerEntry, AnswersDocument, FieldEntry, FieldValidation, FieldsDocument,
};
use super::field_type::FieldType;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One problem found while validating a document, scoped to a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

const FIELD_ENTRY_KEYS: [&str; 7] = [
    "id",
    "name",
    "description",
    "type",
    "position",
    "options",
    "validation",
];

const ANSWER_ENTRY_KEYS: [&str; 3] = ["fieldId", "value", "type"];

/// Validate an untyped fields document and construct the typed form.
///
/// Returns every issue found; the typed document is only built when the value
/// is fully conformant.
pub fn validate_fields_document(
    value: &Value,
) -> std::result::Result<FieldsDocument, Vec<ValidationIssue>> {
    let object = match value.as_object() {
        Some(object) => object,
        None => {
            return Err(vec![ValidationIssue::new("$", "expected an object")]);
        }
    };

    let mut issues = Vec::new();
    let mut entries = BTreeMap::new();

    for (key, entry_value) in object {
        if let Some(entry) = validate_field_entry(key, entry_value, &mut issues) {
            entries.insert(key.clone(), entry);
        }
    }

    if issues.is_empty() {
        Ok(FieldsDocument(entries))
    } else {
        Err(issues)
    }
}

/// Validate an untyped answers document and construct the typed form.
pub fn validate_answers_document(
    value: &Value,
) -> std::result::Result<AnswersDocument, Vec<ValidationIssue>> {
    let object = match value.as_object() {
        Some(object) => object,
        None => {
            return Err(vec![ValidationIssue::new("$", "expected an object")]);
        }
    };

    let mut issues = Vec::new();
    let mut entries = BTreeMap::new();

    for (key, entry_value) in object {
        if let Some(entry) = validate_answer_entry(key, entry_value, &mut issues) {
            entries.insert(key.clone(), entry);
        }
    }

    if issues.is_empty() {
        Ok(AnswersDocument(entries))
    } else {
        Err(issues)
    }
}

fn validate_field_entry(
    key: &str,
    value: &Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<FieldEntry> {
    let entry = match value.as_object() {
        Some(entry) => entry,
        None => {
            issues.push(ValidationIssue::new(key, "expected an object"));
            return None;
        }
    };

    let before = issues.len();

    reject_unknown_keys(key, entry, &FIELD_ENTRY_KEYS, issues);

    let id = require_string(key, entry, "id", issues);
    let name = require_string(key, entry, "name", issues);
    let field_type = require_field_type(key, entry, issues);
    let description = optional_string(key, entry, "description", issues).unwrap_or_default();
    let position = optional_integer(key, entry, "position", issues).unwrap_or(0);
    let options = optional_string_array(key, entry, "options", issues).unwrap_or_default();
    let required = require_validation_object(key, entry, issues);

    if let Some(id) = &id {
        if id != key {
            issues.push(ValidationIssue::new(
                format!("{key}.id"),
                format!("id \"{id}\" does not match its document key"),
            ));
        }
    }

    if issues.len() > before {
        return None;
    }

    Some(FieldEntry {
        id: id?,
        name: name?,
        description,
        field_type: field_type?,
        position,
        options,
        validation: FieldValidation {
            required: required?,
        },
    })
}

fn validate_answer_entry(
    key: &str,
    value: &Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<AnswerEntry> {
    let entry = match value.as_object() {
        Some(entry) => entry,
        None => {
            issues.push(ValidationIssue::new(key, "expected an object"));
            return None;
        }
    };

    let before = issues.len();

    reject_unknown_keys(key, entry, &ANSWER_ENTRY_KEYS, issues);

    let field_id = require_string(key, entry, "fieldId", issues);
    let value_field = require_string(key, entry, "value", issues);
    let field_type = require_field_type(key, entry, issues);

    if let Some(field_id) = &field_id {
        if field_id != key {
            issues.push(ValidationIssue::new(
                format!("{key}.fieldId"),
                format!("fieldId \"{field_id}\" does not match its document key"),
            ));
        }
    }

    if issues.len() > before {
        return None;
    }

    Some(AnswerEntry {
        field_id: field_id?,
        value: value_field?,
        field_type: field_type?,
    })
}

fn reject_unknown_keys(
    key: &str,
    entry: &Map<String, Value>,
    allowed: &[&str],
    issues: &mut Vec<ValidationIssue>,
) {
    for entry_key in entry.keys() {
        if !allowed.contains(&entry_key.as_str()) {
            issues.push(ValidationIssue::new(
                format!("{key}.{entry_key}"),
                "unknown key",
            ));
        }
    }
}

fn require_string(
    key: &str,
    entry: &Map<String, Value>,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match entry.get(name) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(ValidationIssue::new(
                format!("{key}.{name}"),
                "expected a string",
            ));
            None
        }
        None => {
            issues.push(ValidationIssue::new(
                format!("{key}.{name}"),
                "missing required key",
            ));
            None
        }
    }
}

fn optional_string(
    key: &str,
    entry: &Map<String, Value>,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match entry.get(name) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(ValidationIssue::new(
                format!("{key}.{name}"),
                "expected a string",
            ));
            None
        }
        None => None,
    }
}

fn optional_integer(
    key: &str,
    entry: &Map<String, Value>,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<i64> {
    match entry.get(name) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Some(i),
            None => {
                issues.push(ValidationIssue::new(
                    format!("{key}.{name}"),
                    "expected an integer",
                ));
                None
            }
        },
        Some(_) => {
            issues.push(ValidationIssue::new(
                format!("{key}.{name}"),
                "expected a number",
            ));
            None
        }
        None => None,
    }
}

fn optional_string_array(
    key: &str,
    entry: &Map<String, Value>,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Vec<String>> {
    let items = match entry.get(name) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            issues.push(ValidationIssue::new(
                format!("{key}.{name}"),
                "expected an array",
            ));
            return None;
        }
        None => return None,
    };

    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;

    for (index, item) in items.iter().enumerate() {
        match item {
            Value::String(s) => out.push(s.clone()),
            _ => {
                issues.push(ValidationIssue::new(
                    format!("{key}.{name}[{index}]"),
                    "expected a string",
                ));
                ok = false;
            }
        }
    }

    if ok {
        Some(out)
    } else {
        None
    }
}

fn require_field_type(
    key: &str,
    entry: &Map<String, Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<FieldType> {
    let raw = require_string(key, entry, "type", issues)?;

    match FieldType::parse(&raw) {
        Some(field_type) => Some(field_type),
        None => {
            issues.push(ValidationIssue::new(
                format!("{key}.type"),
                format!("unknown field type \"{raw}\""),
            ));
            None
        }
    }
}

fn require_validation_object(
    key: &str,
    entry: &Map<String, Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<bool> {
    let validation = match entry.get("validation") {
        Some(Value::Object(validation)) => validation,
        Some(_) => {
            issues.push(ValidationIssue::new(
                format!("{key}.validation"),
                "expected an object",
            ));
            return None;
        }
        None => {
            issues.push(ValidationIssue::new(
                format!("{key}.validation"),
                "missing required key",
            ));
            return None;
        }
    };

    for validation_key in validation.keys() {
        if validation_key != "required" {
            issues.push(ValidationIssue::new(
                format!("{key}.validation.{validation_key}"),
                "unknown key",
            ));
        }
    }

    match validation.get("required") {
        Some(Value::Bool(required)) => Some(*required),
        Some(_) => {
            issues.push(ValidationIssue::new(
                format!("{key}.validation.required"),
                "expected a boolean",
            ));
            None
        }
        None => {
            issues.push(ValidationIssue::new(
                format!("{key}.validation.required"),
                "missing required key",
            ));
            None
        }
    }
}
