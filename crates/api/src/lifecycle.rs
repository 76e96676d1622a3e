use crate::ApiResult;
use async_trait::async_trait;
use std::sync::Arc;

/// How a refresh request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cache was newer than the storage tree and has been published.
    LoadedFromCache { extensions: usize },
    /// The storage tree was scanned and a new snapshot published.
    Rebuilt { extensions: usize },
    /// Another rebuild was already running; nothing was done.
    Skipped,
}

/// Handle on the running refresh scheduler.
pub trait RefreshTrigger: Send + Sync {
    /// Request an immediate rebuild. Coalesces with any pending request.
    fn trigger(&self);

    /// Stop the scheduler and any watcher feeding it.
    fn stop(&self);
}

#[async_trait]
pub trait CatalogLifecycle: Send + Sync {
    /// Publish the cache when it is fresh, otherwise rebuild from the storage tree.
    async fn refresh(&self) -> ApiResult<RefreshOutcome>;

    /// Rebuild from the storage tree, ignoring the cache.
    async fn rebuild(&self) -> ApiResult<RefreshOutcome>;

    /// Load the cache if it is fresh. Returns whether a snapshot was published.
    async fn load(&self) -> ApiResult<bool>;

    /// Persist the current snapshot to the cache.
    async fn save(&self) -> ApiResult<()>;

    /// Start the background scheduler (and watcher, when enabled).
    async fn start_scheduler(&self) -> ApiResult<Arc<dyn RefreshTrigger>>;

    /// Resolves once the first snapshot has been published.
    async fn wait_loaded(&self);

    /// Remove the cache artifact.
    async fn clear_cache(&self) -> ApiResult<()>;
}
