//! Turns one extension directory into a normalized [`ExtensionRecord`].

use super::version::parse_version;
use super::{LATEST_FILE, VERSION_FILE};
use crate::config::MirrorConfig;
use crate::error::{CatalogError, Result};
use crate::util::read_json;
use semver::Version;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use vscmirror_api::models::{ExtensionRecord, ExtensionStats, VersionRecord};

#[derive(Debug, Clone)]
pub struct MetadataLoader {
    url_root: String,
}

impl MetadataLoader {
    pub fn new(url_root: impl Into<String>) -> Self {
        Self {
            url_root: url_root.into(),
        }
    }

    pub fn from_config(config: &MirrorConfig) -> Self {
        Self::new(config.url_root.clone())
    }

    /// Loads `latest.json` plus every sibling version directory.
    ///
    /// Fails with `NotFound` when the canonical description is missing, has no
    /// identity or has no versions, and with `Malformed` when it cannot be decoded
    /// or any version string does not parse.
    pub fn load(&self, extension_dir: &Path) -> Result<ExtensionRecord> {
        let latest_path = extension_dir.join(LATEST_FILE);
        let raw = read_json(&latest_path)?;
        if !has_identity(&raw) || !has_versions(&raw) {
            return Err(CatalogError::NotFound(latest_path));
        }

        let mut record: ExtensionRecord =
            serde_json::from_value(raw).map_err(|e| CatalogError::malformed(&latest_path, e))?;
        self.normalize_stats(&mut record);

        let mut versions = Vec::with_capacity(record.versions.len());
        for mut version in std::mem::take(&mut record.versions) {
            let parsed = parse_checked(&latest_path, &version)?;
            self.resolve_assets(extension_dir, &mut version);
            versions.push((parsed, version));
        }

        for (path, version) in self.sibling_versions(extension_dir) {
            let parsed = parse_checked(&path, &version)?;
            let duplicate = versions
                .iter()
                .any(|(known, v)| *known == parsed && v.target_platform == version.target_platform);
            if duplicate {
                continue;
            }
            let mut version = version;
            self.resolve_assets(extension_dir, &mut version);
            versions.push((parsed, version));
        }

        // Stable: equal versions keep discovery order.
        versions.sort_by(|(a, _), (b, _)| b.cmp(a));
        record.versions = versions.into_iter().map(|(_, v)| v).collect();
        Ok(record)
    }

    /// First version entry of every `*/extension.json` below the extension directory,
    /// in directory-name order. Unreadable entries are skipped; an unreadable
    /// directory yields nothing.
    fn sibling_versions(&self, extension_dir: &Path) -> Vec<(PathBuf, VersionRecord)> {
        let entries = match fs::read_dir(extension_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    "Cannot list {}, serving latest only: {}",
                    extension_dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .map(|entry| entry.path())
            .collect();
        dirs.sort();

        let mut found = Vec::new();
        for dir in dirs {
            let path = dir.join(VERSION_FILE);
            if !path.is_file() {
                continue;
            }
            let version = read_json(&path).and_then(|raw| first_version(&path, raw));
            match version {
                Ok(version) => found.push((path, version)),
                Err(e) => debug!("Skipping version entry: {}", e),
            }
        }
        found
    }

    fn resolve_assets(&self, extension_dir: &Path, version: &mut VersionRecord) {
        let base = format!(
            "{}/{}",
            extension_base_uri(&self.url_root, extension_dir),
            version.version
        );
        let asset_uri = match &version.target_platform {
            Some(platform) => format!("{base}/{platform}"),
            None => base,
        };
        for file in &mut version.files {
            file.source = format!("{}/{}", asset_uri, file.asset_type);
        }
        version.fallback_asset_uri = asset_uri.clone();
        version.asset_uri = asset_uri;
    }

    fn normalize_stats(&self, record: &mut ExtensionRecord) {
        match record.statistics.as_deref() {
            Some(statistics) if !statistics.is_empty() => {
                record.stats = ExtensionStats::from_statistics(statistics);
            }
            _ => {
                debug!(
                    "Statistics are missing from extension {}, generating defaults",
                    record.identity
                );
                record.stats = ExtensionStats::default();
            }
        }
    }
}

/// `url_root` followed by the extension directory path.
pub fn extension_base_uri(url_root: &str, extension_dir: &Path) -> String {
    let path = extension_dir.to_string_lossy();
    let url_root = url_root.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{url_root}{path}")
    } else {
        format!("{url_root}/{path}")
    }
}

fn has_identity(raw: &Value) -> bool {
    raw.get("identity")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

fn has_versions(raw: &Value) -> bool {
    raw.get("versions")
        .and_then(Value::as_array)
        .is_some_and(|v| !v.is_empty())
}

fn first_version(path: &Path, mut raw: Value) -> Result<VersionRecord> {
    let first = raw
        .get_mut("versions")
        .and_then(Value::as_array_mut)
        .filter(|versions| !versions.is_empty())
        .map(|versions| versions.swap_remove(0))
        .ok_or_else(|| CatalogError::NotFound(path.to_path_buf()))?;
    serde_json::from_value(first).map_err(|e| CatalogError::malformed(path, e))
}

fn parse_checked(path: &Path, version: &VersionRecord) -> Result<Version> {
    parse_version(&version.version).ok_or_else(|| {
        CatalogError::malformed(path, format!("invalid version {:?}", version.version))
    })
}
