//! Poll snapshots
//!
//! Saves and loads the full live-poll map as a single self-describing
//! JSON document. The document carries an explicit schema version so a
//! future shape change fails loudly instead of silently misreading old
//! files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::model::Poll;

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors from snapshot save/load.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write snapshot file: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("unsupported snapshot version {0} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    polls: HashMap<String, Poll>,
}

/// Write the poll map to `path`. The file is written to a temporary
/// sibling first and renamed into place.
pub fn save(path: &Path, polls: &HashMap<String, Poll>) -> Result<(), SnapshotError> {
    let doc = SnapshotFile {
        version: SNAPSHOT_VERSION,
        polls: polls.clone(),
    };
    let bytes = serde_json::to_vec(&doc).map_err(SnapshotError::Encode)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(SnapshotError::Write)?;
    fs::rename(&tmp, path).map_err(SnapshotError::Write)
}

/// Read a poll map back from `path`. A version other than
/// [`SNAPSHOT_VERSION`] is rejected.
pub fn load(path: &Path) -> Result<HashMap<String, Poll>, SnapshotError> {
    let bytes = fs::read(path).map_err(SnapshotError::Read)?;
    let doc: SnapshotFile = serde_json::from_slice(&bytes).map_err(SnapshotError::Decode)?;
    if doc.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(doc.version));
    }
    Ok(doc.polls)
}
