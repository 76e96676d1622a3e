use crate::error::{CatalogError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads a JSON document written by the sync process.
///
/// A leading BOM is tolerated. Missing files and empty documents (`null`, `{}`, `[]`)
/// are both reported as `NotFound`, since neither describes anything.
pub fn read_json(path: &Path) -> Result<Value> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(CatalogError::malformed(path, e)),
    };
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    let value: Value = serde_json::from_slice(body).map_err(|e| CatalogError::malformed(path, e))?;

    let empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Err(CatalogError::NotFound(path.to_path_buf()));
    }
    Ok(value)
}

pub fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

pub fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

pub fn now_secs() -> u64 {
    unix_secs(SystemTime::now())
}
