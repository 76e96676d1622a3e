use serde::{Deserialize, Serialize};

/// Rebuild stage reported while indexing. Observational only.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexingStage {
    #[default]
    Idle,
    Scanning,
    Processing,
    Caching,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexingProgress {
    pub stage: IndexingStage,
    pub current: usize,
    pub total: usize,
}

impl IndexingProgress {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn new(stage: IndexingStage, current: usize, total: usize) -> Self {
        Self {
            stage,
            current,
            total,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// No snapshot has been published yet.
    Loading,
    Indexing,
    Ready,
}

/// Full observability report for status endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CatalogStatus {
    pub status: ServiceState,
    pub loading_complete: bool,
    pub indexing_active: bool,
    pub indexing_progress: Option<IndexingProgress>,
    pub timestamp: u64,
    pub server_uptime_seconds: u64,
    pub refresh: RefreshInfo,
    pub extensions: CatalogSummary,
    pub cache: CacheInfo,
    pub configuration: ConfigurationInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RefreshInfo {
    pub last_refresh_timestamp: Option<u64>,
    pub last_refresh_ago_seconds: Option<u64>,
    pub last_refresh_ago: Option<String>,
    pub next_refresh_timestamp: u64,
    pub next_refresh_in_seconds: u64,
    pub next_refresh_in: String,
    pub is_checking_now: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogSummary {
    pub loaded_count: usize,
    pub total_versions: usize,
    pub unique_publishers: usize,
    pub recommended_count: usize,
    pub top_categories: Vec<CategoryCount>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheInfo {
    pub exists: bool,
    pub size_bytes: Option<u64>,
    pub modified_timestamp: Option<u64>,
    pub age_seconds: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationInfo {
    pub cache_location: String,
    pub update_interval_seconds: u64,
    pub update_interval: String,
    pub artifacts_root: String,
    pub extensions_root: String,
    pub url_root: String,
    pub workers: usize,
}

/// Renders seconds as `H:MM:SS`, `D day(s), H:MM:SS` past one day.
pub fn human_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let rem = seconds % 86_400;
    let clock = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}
