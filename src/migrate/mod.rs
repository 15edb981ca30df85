//! The v2.6.0 data migration engine
//!
//! Converts the normalized registration-field layout into per-parent JSON
//! documents: every event gets a fields document built from its
//! `registration_fields` rows (options inlined), every registration gets an
//! answers document built from its `registration_data` rows, and the three
//! legacy tables are deleted. The whole run is one transaction; any failure
//! rolls everything back and the store is exactly as it was.
//!
//! The run is irreversible on success. [`down`] exists as the declared
//! inverse and intentionally performs no work.

pub mod extract;
pub mod load;
pub mod transform;

pub use extract::{extract, Extracted};
pub use load::{load, LoadStats};
pub use transform::{transform, Grouped};

use crate::error::Result;
use crate::store::Store;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Where a run ended up, and the checkpoints it passed through on the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationPhase {
    Start,
    Extracted,
    Transformed,
    Validating,
    Committed,
    RolledBack,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MigrationPhase::Start => "start",
            MigrationPhase::Extracted => "extracted",
            MigrationPhase::Transformed => "transformed",
            MigrationPhase::Validating => "validating",
            MigrationPhase::Committed => "committed",
            MigrationPhase::RolledBack => "rolled_back",
        };
        f.write_str(label)
    }
}

/// Result of one migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// Terminal phase: `Committed`, or `RolledBack` for a dry run.
    pub phase: MigrationPhase,

    /// Wall-clock duration of the run.
    pub duration_ms: u64,

    /// Events whose fields column was written.
    pub events_updated: usize,

    /// Registrations whose data column was written.
    pub registrations_updated: usize,

    /// Field entries across all fields documents.
    pub fields_migrated: usize,

    /// Answer entries across all answers documents.
    pub answers_migrated: usize,

    /// Answer rows dropped for missing registration or field references.
    pub orphaned_answers: usize,

    /// Legacy rows deleted (options, data, fields).
    pub legacy_rows_deleted: usize,

    /// True when the run validated everything but rolled back on purpose.
    pub dry_run: bool,
}

/// Options for a migration run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrateOptions {
    /// Execute every stage including validation, then roll back instead of
    /// committing.
    pub dry_run: bool,
}

/// The migration engine. Owns nothing but a reference to the store; one
/// instance runs one migration.
pub struct Migrator<'a> {
    store: &'a Store,
    options: MigrateOptions,
}

impl<'a> Migrator<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            options: MigrateOptions::default(),
        }
    }

    pub fn with_options(store: &'a Store, options: MigrateOptions) -> Self {
        Self { store, options }
    }

    /// Run the migration: extract, transform, validate and write, clean up,
    /// commit. Every failure path rolls the transaction back before the
    /// error is returned.
    pub fn run(&self) -> Result<MigrationReport> {
        let started = Instant::now();
        let mut phase = MigrationPhase::Start;

        info!("starting v2.6.0 data migration");

        let mut tx = self.store.begin();

        let extracted = match extract(&tx) {
            Ok(extracted) => extracted,
            Err(e) => {
                error!(phase = %phase, error = %e, "migration failed, rolling back");
                tx.rollback();
                return Err(e);
            }
        };
        phase = MigrationPhase::Extracted;

        if extracted.is_empty() {
            info!("no legacy rows found, nothing to migrate");
        }

        let grouped = match transform(&extracted) {
            Ok(grouped) => grouped,
            Err(e) => {
                error!(phase = %phase, error = %e, "migration failed, rolling back");
                tx.rollback();
                return Err(e);
            }
        };
        phase = MigrationPhase::Transformed;
        debug!(phase = %phase, "documents grouped");

        phase = MigrationPhase::Validating;
        let stats = match load(&mut tx, &grouped) {
            Ok(stats) => stats,
            Err(e) => {
                error!(phase = %phase, error = %e, "migration failed, rolling back");
                tx.rollback();
                return Err(e);
            }
        };

        if self.options.dry_run {
            info!("dry run: validation passed, rolling back");
            tx.rollback();
            phase = MigrationPhase::RolledBack;
        } else {
            match tx.commit() {
                Ok(()) => phase = MigrationPhase::Committed,
                Err(e) => {
                    error!(phase = %phase, error = %e, "commit failed, store unchanged");
                    return Err(e);
                }
            }
            info!(
                events = stats.events_updated,
                registrations = stats.registrations_updated,
                orphaned = grouped.orphaned_answers,
                "v2.6.0 data migration complete"
            );
        }

        Ok(MigrationReport {
            phase,
            duration_ms: started.elapsed().as_millis() as u64,
            events_updated: stats.events_updated,
            registrations_updated: stats.registrations_updated,
            fields_migrated: stats.fields_written,
            answers_migrated: stats.answers_written,
            orphaned_answers: grouped.orphaned_answers,
            legacy_rows_deleted: stats.legacy_rows_deleted,
            dry_run: self.options.dry_run,
        })
    }
}

/// Run the migration against a store.
pub fn up(store: &Store) -> Result<MigrationReport> {
    Migrator::new(store).run()
}

/// Declared inverse of [`up`]. The migration destroys its source tables, so
/// there is nothing to rebuild from; this logs and returns.
pub fn down(_store: &Store) -> Result<()> {
    warn!("v2.6.0 data migration is irreversible; down is a no-op");
    Ok(())
}
