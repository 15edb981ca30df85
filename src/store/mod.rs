//! Embedded relational store
//!
//! A small single-file store exposing exactly the surface the migration
//! needs: read-all with one level of eager joins, update-by-id on the two
//! parent tables, delete-by-table for the legacy tables, and transaction
//! demarcation with explicit rollback.
//!
//! The committed state lives behind one `parking_lot::RwLock`; file-backed
//! stores additionally persist every commit as a checksummed JSON snapshot.

pub mod snapshot;
pub mod tables;
pub mod transaction;

pub use tables::{
    AnswerWithField, EventRow, FieldWithOptions, RegistrationDataRow,
    RegistrationFieldOptionRow, RegistrationFieldRow, RegistrationRow, Table, TableSet,
};
pub use transaction::Transaction;

use crate::error::Result;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::info;

/// Row counts across all tables, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub events: usize,
    pub registrations: usize,
    pub registration_fields: usize,
    pub registration_field_options: usize,
    pub registration_data: usize,
}

impl TableCounts {
    /// Total rows remaining in the legacy normalized tables.
    pub fn legacy_rows(&self) -> usize {
        self.registration_fields + self.registration_field_options + self.registration_data
    }
}

pub struct Store {
    path: Option<PathBuf>,
    tables: RwLock<TableSet>,
}

impl Store {
    /// Open a file-backed store, loading the snapshot at `path` if present.
    pub fn open(path: impl AsRef<Path>) -> Result<Store> {
        let path = path.as_ref().to_path_buf();

        let tables = if path.exists() {
            snapshot::load(&path)?
        } else {
            TableSet::default()
        };

        info!(path = %path.display(), "store opened");
        Ok(Store {
            path: Some(path),
            tables: RwLock::new(tables),
        })
    }

    /// An in-memory store with no persistence. Used by tests and dry runs
    /// against seeded data.
    pub fn in_memory() -> Store {
        Store {
            path: None,
            tables: RwLock::new(TableSet::default()),
        }
    }

    /// Begin a transaction over a snapshot of the committed state.
    pub fn begin(&self) -> Transaction<'_> {
        let working = self.tables.read().clone();
        Transaction::new(self, working)
    }

    /// Commit a working set: persist first (file-backed), then swap it in.
    /// A failed persist leaves the committed state unchanged.
    pub(crate) fn apply(&self, working: TableSet) -> Result<()> {
        if let Some(path) = &self.path {
            snapshot::save(path, &working)?;
        }

        *self.tables.write() = working;
        Ok(())
    }

    /// Committed row counts, without opening a transaction.
    pub fn counts(&self) -> TableCounts {
        let tables = self.tables.read();
        TableCounts {
            events: tables.events.len(),
            registrations: tables.registrations.len(),
            registration_fields: tables.registration_fields.len(),
            registration_field_options: tables.registration_field_options.len(),
            registration_data: tables.registration_data.len(),
        }
    }

    /// Committed view of one event row.
    pub fn event(&self, id: &str) -> Option<EventRow> {
        self.tables
            .read()
            .events
            .iter()
            .find(|row| row.id == id)
            .cloned()
    }

    /// Committed view of one registration row.
    pub fn registration(&self, id: &str) -> Option<RegistrationRow> {
        self.tables
            .read()
            .registrations
            .iter()
            .find(|row| row.id == id)
            .cloned()
    }

    /// Committed view of all events.
    pub fn events(&self) -> Vec<EventRow> {
        self.tables.read().events.clone()
    }

    /// Committed view of all registrations.
    pub fn registrations(&self) -> Vec<RegistrationRow> {
        self.tables.read().registrations.clone()
    }
}
