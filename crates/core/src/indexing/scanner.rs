use super::{LATEST_FILE, UPDATE_MARKER};
use crate::error::{CatalogError, Result};
use crate::util::modified_time;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub struct Scanner;

impl Scanner {
    /// Immediate subdirectories of `root` holding a canonical description,
    /// sorted by path. Anything else is silently ignored.
    pub fn extension_dirs(root: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(root).map_err(|source| CatalogError::Filesystem {
            path: root.to_path_buf(),
            source,
        })?;

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .map(|entry| entry.path())
            .filter(|path| path.join(LATEST_FILE).is_file())
            .collect();
        dirs.sort();
        Ok(dirs)
    }

    /// Newest modification time among the extension directories and their
    /// `updated.json` markers. `None` if the tree cannot be statted.
    pub fn newest_mtime(root: &Path) -> Option<SystemTime> {
        let entries = fs::read_dir(root).ok()?;
        let mut newest = SystemTime::UNIX_EPOCH;

        for entry in entries {
            let entry = entry.ok()?;
            if !entry.file_type().ok()?.is_dir() {
                continue;
            }
            newest = newest.max(entry.metadata().ok()?.modified().ok()?);

            let marker = entry.path().join(UPDATE_MARKER);
            if marker.exists() {
                newest = newest.max(modified_time(&marker).ok()?);
            }
        }
        Some(newest)
    }
}
