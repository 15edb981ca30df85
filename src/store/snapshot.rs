//! Snapshot persistence for the file-backed store
//!
//! The whole table set is serialized to JSON and wrapped in an envelope
//! carrying a format version and a crc32 checksum of the serialized tables.
//! The checksum is verified on load; a mismatch means the file was truncated
//! or edited and the store refuses to open it.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write leaves the previous snapshot intact.

use super::tables::TableSet;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    version: u32,
    checksum: u32,
    tables: TableSet,
}

fn table_checksum(tables: &TableSet) -> Result<u32> {
    let body = serde_json::to_vec(tables)?;
    Ok(crc32fast::hash(&body))
}

/// Write the table set to `path`, replacing any previous snapshot.
pub fn save(path: &Path, tables: &TableSet) -> Result<()> {
    let envelope = SnapshotEnvelope {
        version: SNAPSHOT_VERSION,
        checksum: table_checksum(tables)?,
        tables: tables.clone(),
    };

    let bytes = serde_json::to_vec_pretty(&envelope)?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, &bytes)?;
    fs::rename(&tmp_path, path)?;

    debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

/// Load a table set from `path`, verifying version and checksum.
pub fn load(path: &Path) -> Result<TableSet> {
    let bytes = fs::read(path)?;
    let envelope: SnapshotEnvelope = serde_json::from_slice(&bytes)?;

    if envelope.version != SNAPSHOT_VERSION {
        return Err(Error::UnsupportedSnapshot {
            expected: SNAPSHOT_VERSION,
            found: envelope.version,
        });
    }

    let actual = table_checksum(&envelope.tables)?;
    if actual != envelope.checksum {
        return Err(Error::ChecksumMismatch {
            expected: envelope.checksum,
            actual,
        });
    }

    debug!(path = %path.display(), "snapshot loaded");
    Ok(envelope.tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tables::EventRow;
    use serde_json::json;

    fn sample_tables() -> TableSet {
        let mut tables = TableSet::default();
        tables.events.push(EventRow {
            id: "evt-1".to_string(),
            name: "Test Event".to_string(),
            description: Some("Test Event Description".to_string()),
            link: None,
            image_url: None,
            event_display_rank: None,
            fields: json!({}),
        });
        tables
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let tables = sample_tables();
        save(&path, &tables).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, tables);
    }

    #[test]
    fn test_tampered_snapshot_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        save(&path, &sample_tables()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let tampered = text.replace("Test Event", "Other Event");
        assert_ne!(text, tampered);
        std::fs::write(&path, tampered).unwrap();

        match load(&path) {
            Err(Error::ChecksumMismatch { .. }) => {}
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        save(&path, &sample_tables()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let bumped = text.replacen("\"version\": 1", "\"version\": 99", 1);
        std::fs::write(&path, bumped).unwrap();

        match load(&path) {
            Err(Error::UnsupportedSnapshot { found: 99, .. }) => {}
            other => panic!("expected unsupported snapshot, got {other:?}"),
        }
    }
}
