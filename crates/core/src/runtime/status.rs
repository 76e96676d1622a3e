use super::*;
use crate::util::{now_secs, unix_secs};
use vscmirror_api::models::{
    CatalogStatus, ConfigurationInfo, RefreshInfo, ServiceState, human_duration,
};

impl CatalogEngine {
    /// Point-in-time report. Counters are best effort.
    pub async fn status(&self) -> CatalogStatus {
        let snapshot = self.snapshot().await;
        let loaded = self.index.is_loaded();
        let indexing = self.index.is_indexing();
        let now = now_secs();

        let status = if !loaded {
            ServiceState::Loading
        } else if indexing {
            ServiceState::Indexing
        } else {
            ServiceState::Ready
        };

        CatalogStatus {
            status,
            loading_complete: loaded,
            indexing_active: indexing,
            indexing_progress: indexing.then(|| self.index.progress()),
            timestamp: now,
            server_uptime_seconds: now.saturating_sub(unix_secs(self.started_at)),
            refresh: self.refresh_info(now),
            extensions: snapshot.summary(),
            cache: self.cache.inspect(),
            configuration: ConfigurationInfo {
                cache_location: self.config.cache_file.display().to_string(),
                update_interval_seconds: self.config.refresh_interval.as_secs(),
                update_interval: human_duration(self.config.refresh_interval.as_secs()),
                artifacts_root: self.config.artifacts_root.display().to_string(),
                extensions_root: self.config.extensions_root.display().to_string(),
                url_root: self.config.url_root.clone(),
                workers: self.config.workers,
            },
        }
    }

    fn refresh_info(&self, now: u64) -> RefreshInfo {
        let times = self.index.refresh_times();
        let last = times.last.map(unix_secs);
        let next = times.next.map(unix_secs).unwrap_or(now);
        let next_in = next.saturating_sub(now);

        RefreshInfo {
            last_refresh_timestamp: last,
            last_refresh_ago_seconds: last.map(|l| now.saturating_sub(l)),
            last_refresh_ago: last.map(|l| human_duration(now.saturating_sub(l))),
            next_refresh_timestamp: next,
            next_refresh_in_seconds: next_in,
            next_refresh_in: human_duration(next_in),
            is_checking_now: self.index.is_refreshing(),
        }
    }
}
