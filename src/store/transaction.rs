//! Transactions over the table set
//!
//! A transaction clones the committed table set and works on the clone; the
//! store only observes the changes when `commit` swaps the working set in
//! (and persists it, for a file-backed store). Dropping a transaction, or
//! calling `rollback`, discards the working set and the store is untouched.
//!
//! This is snapshot isolation for a single writer. The migration assumes
//! exclusive access for its one run, so no conflict detection is attempted.

use super::tables::{
    AnswerWithField, EventRow, FieldWithOptions, RegistrationDataRow,
    RegistrationFieldOptionRow, RegistrationFieldRow, RegistrationRow, Table, TableSet,
};
use super::Store;
use crate::error::Result;
use serde_json::Value;
use tracing::debug;

/// A read-write transaction against a [`Store`].
pub struct Transaction<'a> {
    store: &'a Store,
    working: TableSet,
}

impl<'a> Transaction<'a> {
    pub(super) fn new(store: &'a Store, working: TableSet) -> Self {
        Self { store, working }
    }

    // ----- reads -----

    /// All field definition rows with their option rows eagerly attached,
    /// options in table order.
    pub fn registration_fields_with_options(&self) -> Result<Vec<FieldWithOptions>> {
        let rows = self
            .working
            .registration_fields
            .iter()
            .map(|row| FieldWithOptions {
                row: row.clone(),
                options: self
                    .working
                    .registration_field_options
                    .iter()
                    .filter(|option| option.registration_field_id == row.id)
                    .cloned()
                    .collect(),
            })
            .collect();

        Ok(rows)
    }

    /// All answer rows with the referenced field definition eagerly joined.
    /// The join is left-outer: a broken reference yields `field: None`.
    pub fn registration_data_with_fields(&self) -> Result<Vec<AnswerWithField>> {
        let rows = self
            .working
            .registration_data
            .iter()
            .map(|row| AnswerWithField {
                row: row.clone(),
                field: row.registration_field_id.as_ref().and_then(|field_id| {
                    self.working
                        .registration_fields
                        .iter()
                        .find(|field| &field.id == field_id)
                        .cloned()
                }),
            })
            .collect();

        Ok(rows)
    }

    pub fn event(&self, id: &str) -> Option<&EventRow> {
        self.working.events.iter().find(|row| row.id == id)
    }

    pub fn registration(&self, id: &str) -> Option<&RegistrationRow> {
        self.working.registrations.iter().find(|row| row.id == id)
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.working.row_count(table)
    }

    // ----- writes -----

    /// Set the fields document column of one event by primary key.
    /// Returns the number of rows matched (0 or 1).
    pub fn update_event_fields(&mut self, id: &str, fields: Value) -> Result<usize> {
        let matched = match self.working.events.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.fields = fields;
                1
            }
            None => 0,
        };
        Ok(matched)
    }

    /// Set the answers document column of one registration by primary key.
    /// Returns the number of rows matched (0 or 1).
    pub fn update_registration_data(&mut self, id: &str, data: Value) -> Result<usize> {
        let matched = match self
            .working
            .registrations
            .iter_mut()
            .find(|row| row.id == id)
        {
            Some(row) => {
                row.data = data;
                1
            }
            None => 0,
        };
        Ok(matched)
    }

    /// Delete every row of a table. Returns the number of rows removed.
    pub fn delete_all(&mut self, table: Table) -> Result<usize> {
        let removed = self.working.clear_table(table);
        debug!(table = %table, removed, "deleted all rows");
        Ok(removed)
    }

    // ----- seeding (fixtures and demos) -----

    pub fn insert_event(&mut self, row: EventRow) {
        self.working.events.push(row);
    }

    pub fn insert_registration(&mut self, row: RegistrationRow) {
        self.working.registrations.push(row);
    }

    pub fn insert_registration_field(&mut self, row: RegistrationFieldRow) {
        self.working.registration_fields.push(row);
    }

    pub fn insert_registration_field_option(&mut self, row: RegistrationFieldOptionRow) {
        self.working.registration_field_options.push(row);
    }

    pub fn insert_registration_data(&mut self, row: RegistrationDataRow) {
        self.working.registration_data.push(row);
    }

    // ----- demarcation -----

    /// Make the working set the committed state and persist it.
    pub fn commit(self) -> Result<()> {
        self.store.apply(self.working)
    }

    /// Discard the working set. Dropping the transaction does the same; the
    /// explicit form exists so call sites can say what they mean.
    pub fn rollback(self) {
        debug!("transaction rolled back");
    }
}
