use super::*;
use crate::error::CatalogError;
use crate::runtime::index::RefreshGuard;
use tracing::{info, warn};
use vscmirror_api::RefreshOutcome;
use vscmirror_api::models::IndexingStage;

impl CatalogEngine {
    /// Publish the cache if it is newer than the storage tree.
    pub async fn load(&self) -> Result<bool> {
        let cache = Arc::clone(&self.cache);
        let loaded = tokio::task::spawn_blocking(move || cache.load_fresh())
            .await
            .map_err(|e| CatalogError::Internal(e.to_string()))?;

        match loaded {
            Some(snapshot) => {
                let count = snapshot.len();
                self.index.publish(snapshot).await;
                self.index.mark_loaded();
                info!("Loaded {} extensions from cache", count);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persist the published snapshot.
    pub async fn save(&self) -> Result<()> {
        let snapshot = self.snapshot().await;
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || cache.save(&snapshot))
            .await
            .map_err(|e| CatalogError::Internal(e.to_string()))??;
        info!("Saved cache to {}", self.cache.path().display());
        Ok(())
    }

    /// Fresh cache if there is one, otherwise a full rebuild.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.run_refresh(true).await
    }

    /// Full rebuild, ignoring the cache.
    pub async fn rebuild(&self) -> Result<RefreshOutcome> {
        self.run_refresh(false).await
    }

    pub async fn clear_cache(&self) -> Result<bool> {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || cache.clear())
            .await
            .map_err(|e| CatalogError::Internal(e.to_string()))?
    }

    async fn run_refresh(&self, use_cache: bool) -> Result<RefreshOutcome> {
        let Some(guard) = self.index.try_begin_refresh() else {
            info!("Refresh already in progress, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        let result = self.refresh_locked(&guard, use_cache).await;

        let now = SystemTime::now();
        let next = now + self.config.refresh_interval;
        match &result {
            Ok(_) => self.index.record_refresh(now, next),
            Err(e) => {
                warn!("Refresh failed, keeping the previous catalog: {}", e);
                self.index.schedule_next(next);
            }
        }
        drop(guard);
        result
    }

    async fn refresh_locked(
        &self,
        guard: &RefreshGuard<'_>,
        use_cache: bool,
    ) -> Result<RefreshOutcome> {
        if use_cache && self.load().await? {
            let extensions = self.snapshot().await.len();
            return Ok(RefreshOutcome::LoadedFromCache { extensions });
        }

        guard.start_indexing();
        info!("No valid cache, scanning {}", self.config.extensions_root.display());
        let snapshot = self
            .builder
            .build(&self.config.extensions_root, &self.index)
            .await?;

        let extensions = snapshot.len();
        self.index.set_stage(IndexingStage::Caching);
        self.index.publish(snapshot).await;
        self.index.mark_loaded();
        info!("Loaded {} extensions", extensions);

        if let Err(e) = self.save().await {
            warn!("Failed to save cache: {}", e);
        }
        Ok(RefreshOutcome::Rebuilt { extensions })
    }
}
