// ABOUTME: Compressed snapshot save and load for the OccurrenceStore.
// ABOUTME: CBOR-encodes every entry, zstd-compresses it and writes with an atomic rename under the store lock.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use timespotter_core::{OccurrenceKey, OccurrenceRecord, OccurrenceStore};

/// Current snapshot layout version.
const SNAPSHOT_VERSION: u8 = 1;

/// zstd level used when writing snapshots.
const ZSTD_LEVEL: i32 = 3;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot file not found: {0}")]
    Missing(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot encode error: {0}")]
    Encode(String),

    #[error("snapshot decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    key: OccurrenceKey,
    first: u64,
    last: u64,
    count: u64,
}

#[derive(Debug, Serialize)]
struct SnapshotRef<'a> {
    version: u8,
    entries: &'a [SnapshotEntry],
}

#[derive(Debug, Deserialize)]
struct SnapshotData {
    version: u8,
    entries: Vec<SnapshotEntry>,
}

/// Write every entry of `store` to `path`. The store lock is held until the
/// file has been written and renamed into place (or the write failed).
/// Returns the number of keys written.
pub fn save_snapshot(store: &OccurrenceStore, path: &Path) -> Result<usize, SnapshotError> {
    let dump = store.dump();
    let entries: Vec<SnapshotEntry> = dump
        .iter()
        .map(|(key, record)| SnapshotEntry {
            key: *key,
            first: record.first,
            last: record.last,
            count: record.count,
        })
        .collect();

    let mut cbor = Vec::new();
    ciborium::into_writer(
        &SnapshotRef {
            version: SNAPSHOT_VERSION,
            entries: &entries,
        },
        &mut cbor,
    )
    .map_err(|e| SnapshotError::Encode(e.to_string()))?;

    let tmp_path = tmp_path_for(path);
    if let Err(e) = write_compressed(&tmp_path, &cbor).and_then(|()| fs::rename(&tmp_path, path)) {
        match fs::remove_file(&tmp_path) {
            Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                tracing::warn!(path = %tmp_path.display(), "failed to remove temp snapshot: {}", cleanup);
            }
            _ => {}
        }
        return Err(e.into());
    }
    drop(dump);

    tracing::info!(path = %path.display(), keys = entries.len(), "saved snapshot");
    Ok(entries.len())
}

fn write_compressed(path: &Path, data: &[u8]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut encoder = zstd::Encoder::new(BufWriter::new(file), ZSTD_LEVEL)?;
    encoder.write_all(data)?;
    let writer = encoder.finish()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

/// Replace the contents of `store` with the snapshot at `path`. The lock is
/// held while the file is read and decoded; on any failure the store keeps
/// its previous contents. Returns the number of keys loaded.
pub fn load_snapshot(store: &OccurrenceStore, path: &Path) -> Result<usize, SnapshotError> {
    let loaded = store.replace_with(|| read_entries(path))?;
    tracing::info!(path = %path.display(), keys = loaded, "loaded snapshot");
    Ok(loaded)
}

fn read_entries(path: &Path) -> Result<HashMap<OccurrenceKey, OccurrenceRecord>, SnapshotError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SnapshotError::Missing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let raw = zstd::decode_all(BufReader::new(file))
        .map_err(|e| SnapshotError::Decode(format!("decompression failed: {e}")))?;
    let data: SnapshotData =
        ciborium::from_reader(&raw[..]).map_err(|e| SnapshotError::Decode(e.to_string()))?;

    if data.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::Decode(format!(
            "unsupported snapshot version {}",
            data.version
        )));
    }

    Ok(data
        .entries
        .into_iter()
        .map(|e| {
            (
                e.key,
                OccurrenceRecord {
                    first: e.first,
                    last: e.last,
                    count: e.count,
                },
            )
        })
        .collect())
}

/// Fail only if `path` exists and cannot be opened for writing. A missing
/// file is fine: it will be created by the first save.
pub fn check_writable(path: &Path) -> Result<(), SnapshotError> {
    match OpenOptions::new().write(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(e.into()),
        Err(_) => Ok(()),
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
