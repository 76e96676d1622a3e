//! Compressed on-disk copy of the last published snapshot.
//!
//! The cache carries no version marker. It is trusted only while its modification
//! time is strictly newer than every extension directory and `updated.json` marker.

use crate::error::{CatalogError, Result};
use crate::indexing::Scanner;
use crate::model::CatalogSnapshot;
use crate::util::{modified_time, now_secs, unix_secs};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use vscmirror_api::models::CacheInfo;

pub struct CacheStore {
    path: PathBuf,
    extensions_root: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>, extensions_root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extensions_root: extensions_root.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing cache and an unstattable tree both count as stale.
    pub fn is_stale(&self) -> bool {
        let Ok(cache_mtime) = modified_time(&self.path) else {
            return true;
        };
        match Scanner::newest_mtime(&self.extensions_root) {
            Some(tree_mtime) => cache_mtime <= tree_mtime,
            None => true,
        }
    }

    /// Loads the cache if it is fresh. Decode failures are logged and yield `None`.
    pub fn load_fresh(&self) -> Option<CatalogSnapshot> {
        if self.is_stale() {
            tracing::debug!("Cache at {} is stale or missing", self.path.display());
            return None;
        }
        match self.read() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Failed to load cache: {}", e);
                None
            }
        }
    }

    /// Decodes the cache regardless of staleness.
    pub fn read(&self) -> Result<CatalogSnapshot> {
        let file = File::open(&self.path)
            .map_err(|e| CatalogError::Cache(format!("{}: {}", self.path.display(), e)))?;
        let decoder = GzDecoder::new(BufReader::new(file));
        serde_json::from_reader(decoder)
            .map_err(|e| CatalogError::Cache(format!("{}: {}", self.path.display(), e)))
    }

    /// Writes compact gzip JSON to a sibling temp file and renames it into place.
    pub fn save(&self, snapshot: &CatalogSnapshot) -> Result<()> {
        let tmp = self.tmp_path();
        let result = self.write_to(&tmp, snapshot).and_then(|_| {
            fs::rename(&tmp, &self.path).map_err(|e| {
                CatalogError::Cache(format!("rename into {}: {}", self.path.display(), e))
            })
        });
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    /// Removes the cache and any temp file a failed save left behind. Returns
    /// whether a cache file was removed.
    pub fn clear(&self) -> Result<bool> {
        remove_if_present(&self.tmp_path())?;
        remove_if_present(&self.path)
    }

    pub fn inspect(&self) -> CacheInfo {
        let Ok(metadata) = fs::metadata(&self.path) else {
            return CacheInfo::default();
        };
        let modified = metadata.modified().ok().map(unix_secs);
        CacheInfo {
            exists: true,
            size_bytes: Some(metadata.len()),
            modified_timestamp: modified,
            age_seconds: modified.map(|m| now_secs().saturating_sub(m)),
        }
    }

    fn write_to(&self, tmp: &Path, snapshot: &CatalogSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CatalogError::Cache(format!("{}: {}", parent.display(), e)))?;
        }
        let file = File::create(tmp)
            .map_err(|e| CatalogError::Cache(format!("{}: {}", tmp.display(), e)))?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, snapshot)
            .map_err(|e| CatalogError::Cache(e.to_string()))?;
        encoder
            .finish()
            .and_then(|mut writer| writer.flush())
            .map_err(|e| CatalogError::Cache(format!("{}: {}", tmp.display(), e)))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CatalogError::Cache(format!("remove {}: {}", path.display(), e))),
    }
}
