//! The closed set of form field type tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a custom form field.
///
/// The set is closed: a document carrying any other tag fails validation
/// instead of passing through unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "TEXT")]
    Text,

    #[serde(rename = "TEXTAREA")]
    Textarea,

    #[serde(rename = "NUMBER")]
    Number,

    #[serde(rename = "SELECT")]
    Select,

    #[serde(rename = "CHECKBOX")]
    Checkbox,
}

impl FieldType {
    pub const ALL: [FieldType; 5] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Number,
        FieldType::Select,
        FieldType::Checkbox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Textarea => "TEXTAREA",
            FieldType::Number => "NUMBER",
            FieldType::Select => "SELECT",
            FieldType::Checkbox => "CHECKBOX",
        }
    }

    /// Parse a raw tag as stored in the legacy `type` column.
    pub fn parse(tag: &str) -> Option<FieldType> {
        FieldType::ALL.iter().copied().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
