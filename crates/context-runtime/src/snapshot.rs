//! # Origin Snapshots
//!
//! Persist the whole storage area to a JSON file between runs. The file is
//! locked while it is read or written so two simulators pointed at the same
//! path never interleave.
//!
//! ```json
//! { "version": 1, "items": { "lantern:game-state": "{...}" } }
//! ```

use crate::error::RuntimeError;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use shared_types::OriginStorage;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Current snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    items: BTreeMap<String, String>,
}

/// Write every item of `origin` to `path`, replacing its contents.
pub fn save(origin: &OriginStorage, path: &Path) -> Result<(), RuntimeError> {
    let snapshot = SnapshotFile {
        version: SNAPSHOT_VERSION,
        items: origin.snapshot(),
    };
    let body = serde_json::to_vec_pretty(&snapshot)?;

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|e| RuntimeError::io(path, e))?;
    FileExt::lock_exclusive(&file).map_err(|e| RuntimeError::io(path, e))?;

    let written = write_locked(&mut file, &body);
    let unlocked = FileExt::unlock(&file);
    written.map_err(|e| RuntimeError::io(path, e))?;
    unlocked.map_err(|e| RuntimeError::io(path, e))?;

    info!(path = %path.display(), items = snapshot.items.len(), "Snapshot saved");
    Ok(())
}

/// Replace every item of `origin` with the snapshot at `path`. Returns
/// `false` when there is no snapshot yet.
pub fn load(origin: &OriginStorage, path: &Path) -> Result<bool, RuntimeError> {
    if !path.exists() {
        debug!(path = %path.display(), "No snapshot to restore");
        return Ok(false);
    }

    let mut file = File::open(path).map_err(|e| RuntimeError::io(path, e))?;
    FileExt::lock_shared(&file).map_err(|e| RuntimeError::io(path, e))?;
    let mut raw = String::new();
    let read = file.read_to_string(&mut raw);
    let unlocked = FileExt::unlock(&file);
    read.map_err(|e| RuntimeError::io(path, e))?;
    unlocked.map_err(|e| RuntimeError::io(path, e))?;

    let snapshot: SnapshotFile = serde_json::from_str(&raw)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(RuntimeError::SnapshotVersion {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    info!(path = %path.display(), items = snapshot.items.len(), "Snapshot restored");
    origin.restore(snapshot.items);
    Ok(true)
}

fn write_locked(file: &mut File, body: &[u8]) -> std::io::Result<()> {
    file.set_len(0)?;
    file.write_all(body)?;
    file.sync_all()
}
