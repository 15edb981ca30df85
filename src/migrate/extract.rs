//! Extraction stage
//!
//! One full read of both legacy row sets, each with its one level of eager
//! joins. No filtering and no pagination: the migration runs once, offline,
//! against a bounded dataset that fits in memory.

use crate::error::Result;
use crate::store::{AnswerWithField, FieldWithOptions, Transaction};
use tracing::debug;

/// Everything the transformer needs, read in one pass.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub fields: Vec<FieldWithOptions>,
    pub answers: Vec<AnswerWithField>,
}

impl Extracted {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.answers.is_empty()
    }
}

/// Read all field definitions (with options) and all answers (with their
/// referenced field). Any read error aborts the run.
pub fn extract(tx: &Transaction<'_>) -> Result<Extracted> {
    let fields = tx.registration_fields_with_options()?;
    let answers = tx.registration_data_with_fields()?;

    debug!(
        fields = fields.len(),
        answers = answers.len(),
        "extracted legacy rows"
    );

    Ok(Extracted { fields, answers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RegistrationDataRow, RegistrationFieldRow, Store};

    #[test]
    fn test_extract_reads_both_row_sets() {
        let store = Store::in_memory();
        let mut tx = store.begin();

        tx.insert_registration_field(RegistrationFieldRow {
            id: "f-1".to_string(),
            event_id: "evt-1".to_string(),
            name: "Age".to_string(),
            description: None,
            field_type: "NUMBER".to_string(),
            field_display_rank: Some(2),
            required: true,
            for_user: true,
            character_limit: None,
        });
        tx.insert_registration_data(RegistrationDataRow {
            id: "d-1".to_string(),
            registration_id: Some("reg-1".to_string()),
            registration_field_id: Some("f-1".to_string()),
            value: "30".to_string(),
        });

        let extracted = extract(&tx).unwrap();
        assert_eq!(extracted.fields.len(), 1);
        assert_eq!(extracted.answers.len(), 1);
        assert!(!extracted.is_empty());

        let joined = extracted.answers[0].field.as_ref().unwrap();
        assert_eq!(joined.field_type, "NUMBER");
    }

    #[test]
    fn test_extract_on_empty_store() {
        let store = Store::in_memory();
        let tx = store.begin();

        let extracted = extract(&tx).unwrap();
        assert!(extracted.is_empty());
    }
}
