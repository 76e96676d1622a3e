//! Mirror configuration, resolved from the environment.

use crate::error::{CatalogError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ARTIFACTS_ROOT: &str = "/artifacts";
pub const DEFAULT_URL_ROOT: &str = "https://update.code.visualstudio.com";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);
pub const EXTENSIONS_DIR: &str = "extensions";
pub const CACHE_FILE_NAME: &str = "extensions_cache.json.gz";

/// How the storage tree is watched for `updated.json` changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    Disabled,
    /// OS notification backend.
    Native,
    /// Stat-polling at the given interval; needed on network and container volumes.
    Poll(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirrorConfig {
    pub artifacts_root: PathBuf,
    pub extensions_root: PathBuf,
    pub cache_file: PathBuf,
    pub refresh_interval: Duration,
    pub url_root: String,
    pub workers: usize,
    pub watch: WatchMode,
}

impl MirrorConfig {
    /// Defaults for an artifacts root: extensions under `extensions/`, cache beside them.
    pub fn new(artifacts_root: impl Into<PathBuf>) -> Self {
        let artifacts_root = artifacts_root.into();
        Self {
            extensions_root: artifacts_root.join(EXTENSIONS_DIR),
            cache_file: artifacts_root.join(CACHE_FILE_NAME),
            artifacts_root,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            url_root: DEFAULT_URL_ROOT.to_string(),
            workers: vscmirror_ingest::default_worker_count(),
            watch: WatchMode::Native,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let artifacts_root = lookup("ARTIFACTS").unwrap_or_else(|| DEFAULT_ARTIFACTS_ROOT.into());
        let mut config = Self::new(artifacts_root);

        if let Some(dir) = lookup("CACHE_DIR") {
            config.cache_file = PathBuf::from(dir).join(CACHE_FILE_NAME);
        }
        if let Some(raw) = lookup("REFRESH_INTERVAL") {
            config.refresh_interval = Duration::from_secs(parse_number("REFRESH_INTERVAL", &raw)?);
        }
        if let Some(url) = lookup("URL_ROOT") {
            config.url_root = url;
        }
        if let Some(raw) = lookup("VSCMIRROR_WORKERS") {
            config = config.with_workers(parse_number("VSCMIRROR_WORKERS", &raw)? as usize);
        }
        if let Some(raw) = lookup("VSCMIRROR_WATCH_POLL") {
            let secs = parse_number("VSCMIRROR_WATCH_POLL", &raw)?;
            config.watch = WatchMode::Poll(Duration::from_secs(secs.max(1)));
        }
        if lookup("VSCMIRROR_WATCH").is_some_and(|v| matches!(v.as_str(), "0" | "off" | "false")) {
            config.watch = WatchMode::Disabled;
        }

        Ok(config)
    }

    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = path.into();
        self
    }

    pub fn with_extensions_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.extensions_root = path.into();
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_url_root(mut self, url_root: impl Into<String>) -> Self {
        self.url_root = url_root.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, vscmirror_ingest::types::MAX_WORKERS);
        self
    }

    pub fn with_watch(mut self, watch: WatchMode) -> Self {
        self.watch = watch;
        self
    }

    /// The engine refuses to start without an extensions root to scan.
    pub fn validate(&self) -> Result<()> {
        if !self.extensions_root.is_dir() {
            return Err(CatalogError::Config(format!(
                "extensions directory missing at {}; check the sync configuration",
                self.extensions_root.display()
            )));
        }
        if self.refresh_interval.is_zero() {
            return Err(CatalogError::Config(
                "refresh interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| CatalogError::Config(format!("{key}={raw:?}: {e}")))
}
