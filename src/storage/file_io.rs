//! JSON file helpers
//!
//! Table snapshots are replaced atomically: the new contents go to a sibling
//! temp file which is synced and then renamed over the target, so readers
//! see either the old snapshot or the new one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AuditrailError, AuditrailResult};

fn storage_err(action: &str, path: &Path, e: impl std::fmt::Display) -> AuditrailError {
    AuditrailError::Storage(format!("Failed to {} {}: {}", action, path.display(), e))
}

/// Read a JSON document, or `T::default()` when the file is missing
pub fn read_json<T, P>(path: P) -> AuditrailResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(|e| storage_err("open", path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_err("parse", path, e))
}

/// Replace a JSON document atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> AuditrailResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_err("create directory", parent, e))?;
    }

    // Same directory as the target so the rename cannot cross filesystems
    let staged = path.with_extension("json.tmp");

    let result = (|| {
        let file = File::create(&staged).map_err(|e| storage_err("create", &staged, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, data)
            .map_err(|e| storage_err("serialize", &staged, e))?;
        writer.flush().map_err(|e| storage_err("flush", &staged, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| storage_err("sync", &staged, e))?;
        fs::rename(&staged, path).map_err(|e| storage_err("replace", path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&staged);
    }
    result
}
