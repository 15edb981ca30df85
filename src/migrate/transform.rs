//! Transformation stage
//!
//! This is where information is reorganized rather than copied: flat legacy
//! rows become per-parent documents keyed by field id. Two passes, same
//! shape: fields group under their event, answers group under their
//! registration.
//!
//! Candidate records are a distinct type from the validated document entries.
//! The transformer serializes candidates into untyped JSON and the
//! loader/validator turns that into the typed form, so nothing reaches a
//! parent row without passing the schema.
//!
//! Key collisions are last-write-wins: a later row for the same
//! (parent, field id) pair overwrites the earlier one.

use super::extract::Extracted;
use crate::error::Result;
use crate::store::{AnswerWithField, FieldWithOptions};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Pre-validation shape of one field definition entry.
#[derive(Debug, Clone, Serialize)]
pub struct FieldCandidate {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Raw tag straight from the legacy column, not yet checked against the
    /// closed type set.
    #[serde(rename = "type")]
    pub field_type: String,
    pub position: i64,
    pub options: Vec<String>,
    pub validation: CandidateValidation,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateValidation {
    pub required: bool,
}

/// Pre-validation shape of one answer entry.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCandidate {
    #[serde(rename = "fieldId")]
    pub field_id: String,
    pub value: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// Output of the grouping passes: untyped documents keyed by owning row id.
#[derive(Debug, Clone, Default)]
pub struct Grouped {
    pub fields_by_event: BTreeMap<String, Map<String, Value>>,
    pub answers_by_registration: BTreeMap<String, Map<String, Value>>,
    /// Answer rows excluded because their registration or field reference
    /// was absent.
    pub orphaned_answers: usize,
}

impl Grouped {
    pub fn is_empty(&self) -> bool {
        self.fields_by_event.is_empty() && self.answers_by_registration.is_empty()
    }
}

fn field_candidate(field: &FieldWithOptions) -> FieldCandidate {
    FieldCandidate {
        id: field.row.id.clone(),
        name: field.row.name.clone(),
        description: field.row.description.clone().unwrap_or_default(),
        field_type: field.row.field_type.clone(),
        position: field.row.field_display_rank.unwrap_or(0),
        options: field
            .options
            .iter()
            .map(|option| option.value.clone())
            .collect(),
        validation: CandidateValidation {
            required: field.row.required,
        },
    }
}

fn answer_candidate(answer: &AnswerWithField) -> Option<(String, AnswerCandidate)> {
    let registration_id = answer.row.registration_id.clone()?;
    let field = answer.field.as_ref()?;

    Some((
        registration_id,
        AnswerCandidate {
            field_id: field.id.clone(),
            value: answer.row.value.clone(),
            field_type: field.field_type.clone(),
        },
    ))
}

/// Run both grouping passes over the extracted rows.
pub fn transform(extracted: &Extracted) -> Result<Grouped> {
    let mut grouped = Grouped::default();

    // Fields pass: event id -> (field id -> candidate).
    for field in &extracted.fields {
        let candidate = field_candidate(field);
        let value = serde_json::to_value(&candidate)?;

        grouped
            .fields_by_event
            .entry(field.row.event_id.clone())
            .or_default()
            .insert(candidate.id, value);
    }

    // Data pass: registration id -> (field id -> candidate). Rows that
    // cannot be placed in any document are dropped, not fatal.
    for answer in &extracted.answers {
        match answer_candidate(answer) {
            Some((registration_id, candidate)) => {
                let value = serde_json::to_value(&candidate)?;

                grouped
                    .answers_by_registration
                    .entry(registration_id)
                    .or_default()
                    .insert(candidate.field_id, value);
            }
            None => grouped.orphaned_answers += 1,
        }
    }

    debug!(
        events = grouped.fields_by_event.len(),
        registrations = grouped.answers_by_registration.len(),
        orphaned = grouped.orphaned_answers,
        "grouped rows into documents"
    );

    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        RegistrationDataRow, RegistrationFieldOptionRow, RegistrationFieldRow,
    };
    use proptest::prelude::*;

    fn field_row(id: &str, event_id: &str, rank: Option<i64>) -> RegistrationFieldRow {
        RegistrationFieldRow {
            id: id.to_string(),
            event_id: event_id.to_string(),
            name: format!("Field {id}"),
            description: None,
            field_type: "TEXT".to_string(),
            field_display_rank: rank,
            required: false,
            for_user: true,
            character_limit: None,
        }
    }

    fn with_options(
        row: RegistrationFieldRow,
        options: &[&str],
    ) -> FieldWithOptions {
        let options = options
            .iter()
            .enumerate()
            .map(|(index, value)| RegistrationFieldOptionRow {
                id: format!("opt-{index}"),
                registration_field_id: row.id.clone(),
                value: (*value).to_string(),
            })
            .collect();

        FieldWithOptions { row, options }
    }

    fn answer(
        id: &str,
        registration_id: Option<&str>,
        field: Option<RegistrationFieldRow>,
        value: &str,
    ) -> AnswerWithField {
        AnswerWithField {
            row: RegistrationDataRow {
                id: id.to_string(),
                registration_id: registration_id.map(str::to_string),
                registration_field_id: field.as_ref().map(|f| f.id.clone()),
                value: value.to_string(),
            },
            field,
        }
    }

    #[test]
    fn test_fields_group_by_event_with_defaults() {
        let extracted = Extracted {
            fields: vec![
                with_options(field_row("f-1", "evt-1", Some(2)), &[]),
                with_options(field_row("f-2", "evt-1", None), &[]),
                with_options(field_row("f-3", "evt-2", Some(0)), &["A", "B"]),
            ],
            answers: vec![],
        };

        let grouped = transform(&extracted).unwrap();
        assert_eq!(grouped.fields_by_event.len(), 2);

        let evt1 = &grouped.fields_by_event["evt-1"];
        assert_eq!(evt1.len(), 2);
        assert_eq!(evt1["f-1"]["position"], 2);
        assert_eq!(evt1["f-2"]["position"], 0);
        assert_eq!(evt1["f-2"]["description"], "");

        let evt2 = &grouped.fields_by_event["evt-2"];
        assert_eq!(evt2["f-3"]["options"][0], "A");
        assert_eq!(evt2["f-3"]["options"][1], "B");
    }

    #[test]
    fn test_duplicate_field_ids_last_write_wins() {
        let mut first = field_row("f-1", "evt-1", Some(1));
        first.name = "First".to_string();
        let mut second = field_row("f-1", "evt-1", Some(7));
        second.name = "Second".to_string();

        let extracted = Extracted {
            fields: vec![with_options(first, &[]), with_options(second, &[])],
            answers: vec![],
        };

        let grouped = transform(&extracted).unwrap();
        let evt1 = &grouped.fields_by_event["evt-1"];

        assert_eq!(evt1.len(), 1);
        assert_eq!(evt1["f-1"]["name"], "Second");
        assert_eq!(evt1["f-1"]["position"], 7);
    }

    #[test]
    fn test_answers_group_by_registration_and_copy_type() {
        let number_field = field_row("f-1", "evt-1", None);
        let mut select_field = field_row("f-2", "evt-1", None);
        select_field.field_type = "SELECT".to_string();

        let extracted = Extracted {
            fields: vec![],
            answers: vec![
                answer("d-1", Some("reg-1"), Some(number_field), "30"),
                answer("d-2", Some("reg-1"), Some(select_field), "Option 1"),
            ],
        };

        let grouped = transform(&extracted).unwrap();
        let reg1 = &grouped.answers_by_registration["reg-1"];

        assert_eq!(reg1.len(), 2);
        assert_eq!(reg1["f-1"]["value"], "30");
        assert_eq!(reg1["f-1"]["type"], "TEXT");
        assert_eq!(reg1["f-2"]["type"], "SELECT");
        assert_eq!(grouped.orphaned_answers, 0);
    }

    #[test]
    fn test_orphaned_answers_are_dropped_and_counted() {
        let extracted = Extracted {
            fields: vec![],
            answers: vec![
                answer("d-1", None, Some(field_row("f-1", "evt-1", None)), "x"),
                answer("d-2", Some("reg-1"), None, "y"),
            ],
        };

        let grouped = transform(&extracted).unwrap();
        assert!(grouped.answers_by_registration.is_empty());
        assert_eq!(grouped.orphaned_answers, 2);
    }

    #[test]
    fn test_empty_extraction_groups_to_nothing() {
        let grouped = transform(&Extracted {
            fields: vec![],
            answers: vec![],
        })
        .unwrap();

        assert!(grouped.is_empty());
    }

    proptest! {
        /// Every (event, field) pair maps to exactly its last-seen row, and
        /// nothing else appears in any document.
        #[test]
        fn prop_grouping_is_last_write_wins(
            rows in proptest::collection::vec((0u8..4, 0u8..6, 0i64..100), 0..40)
        ) {
            let fields: Vec<FieldWithOptions> = rows
                .iter()
                .map(|(event, field, rank)| {
                    with_options(
                        field_row(
                            &format!("f-{field}"),
                            &format!("evt-{event}"),
                            Some(*rank),
                        ),
                        &[],
                    )
                })
                .collect();

            let extracted = Extracted { fields, answers: vec![] };
            let grouped = transform(&extracted).unwrap();

            let mut expected: BTreeMap<(String, String), i64> = BTreeMap::new();
            for (event, field, rank) in &rows {
                expected.insert(
                    (format!("evt-{event}"), format!("f-{field}")),
                    *rank,
                );
            }

            let mut produced = 0;
            for (event_id, doc) in &grouped.fields_by_event {
                for (field_id, entry) in doc {
                    let key = (event_id.clone(), field_id.clone());
                    prop_assert_eq!(
                        entry["position"].as_i64(),
                        expected.get(&key).copied()
                    );
                    produced += 1;
                }
            }
            prop_assert_eq!(produced, expected.len());
        }
    }
}
