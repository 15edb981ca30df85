//! Load stage: validate documents, write them, clear the legacy tables
//!
//! Every document is validated before anything is written, and the writes
//! land in the caller's transaction, so a validation or write failure at any
//! point leaves nothing behind once the transaction rolls back.
//!
//! What is stored is the re-serialized typed document, not the candidate
//! value that was validated.

use super::transform::Grouped;
use crate::error::{Error, Result};
use crate::schema::{
    validate_answers_document, validate_fields_document, EntityKind, ValidationFailure,
};
use crate::store::{Table, Transaction};
use serde_json::Value;
use tracing::{debug, warn};

/// Write counts from a completed load pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Events whose fields column was updated.
    pub events_updated: usize,
    /// Registrations whose data column was updated.
    pub registrations_updated: usize,
    /// Field entries written across all fields documents.
    pub fields_written: usize,
    /// Answer entries written across all answers documents.
    pub answers_written: usize,
    /// Legacy rows removed after the updates succeeded.
    pub legacy_rows_deleted: usize,
}

/// Validate and write every document, then delete the legacy rows.
pub fn load(tx: &mut Transaction<'_>, grouped: &Grouped) -> Result<LoadStats> {
    let mut stats = LoadStats::default();

    for (event_id, document) in &grouped.fields_by_event {
        let value = Value::Object(document.clone());

        let typed = validate_fields_document(&value).map_err(|issues| {
            Error::from(ValidationFailure::new(
                EntityKind::Event,
                event_id.clone(),
                issues,
            ))
        })?;

        let matched = tx.update_event_fields(event_id, typed.to_value()?)?;
        if matched == 0 {
            warn!(event_id = %event_id, "event not found; fields document dropped");
            continue;
        }

        stats.events_updated += 1;
        stats.fields_written += typed.len();
    }

    for (registration_id, document) in &grouped.answers_by_registration {
        let value = Value::Object(document.clone());

        let typed = validate_answers_document(&value).map_err(|issues| {
            Error::from(ValidationFailure::new(
                EntityKind::Registration,
                registration_id.clone(),
                issues,
            ))
        })?;

        let matched = tx.update_registration_data(registration_id, typed.to_value()?)?;
        if matched == 0 {
            warn!(
                registration_id = %registration_id,
                "registration not found; answers document dropped"
            );
            continue;
        }

        stats.registrations_updated += 1;
        stats.answers_written += typed.len();
    }

    // Child tables before their parent, so a store enforcing referential
    // constraints accepts the order.
    stats.legacy_rows_deleted += tx.delete_all(Table::RegistrationFieldOptions)?;
    stats.legacy_rows_deleted += tx.delete_all(Table::RegistrationData)?;
    stats.legacy_rows_deleted += tx.delete_all(Table::RegistrationFields)?;

    debug!(
        events = stats.events_updated,
        registrations = stats.registrations_updated,
        deleted = stats.legacy_rows_deleted,
        "load pass complete"
    );

    Ok(stats)
}
