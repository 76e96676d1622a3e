//! Catalog engine with snapshot-swap publication.

use crate::cache::CacheStore;
use crate::config::MirrorConfig;
use crate::error::Result;
use crate::features::query::QueryEngine;
use crate::indexing::{CatalogBuilder, MetadataLoader};
use crate::model::CatalogSnapshot;
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use vscmirror_api::models::{ExtensionRecord, QueryRequest, QueryResponse};

pub mod index;
mod lifecycle;
pub mod scheduler;
mod status;
mod watch;

pub use index::{CatalogIndex, RefreshTimes};
pub use scheduler::SchedulerHandle;

/// Owns the catalog and everything that republishes it.
///
/// - Readers get the current snapshot as an `Arc` and never wait on a rebuild
/// - A rebuild builds a complete snapshot off to the side, then swaps it in
/// - At most one refresh runs at a time
pub struct CatalogEngine {
    config: MirrorConfig,
    index: Arc<CatalogIndex>,
    builder: CatalogBuilder,
    cache: Arc<CacheStore>,
    started_at: SystemTime,
    /// Parent token for the scheduler and watcher tasks.
    cancel_token: CancellationToken,
}

impl CatalogEngine {
    pub fn new(config: MirrorConfig) -> Self {
        let builder = CatalogBuilder::new(MetadataLoader::from_config(&config), config.workers);
        let cache = Arc::new(CacheStore::new(
            config.cache_file.clone(),
            config.extensions_root.clone(),
        ));
        Self {
            config,
            index: Arc::new(CatalogIndex::new()),
            builder,
            cache,
            started_at: SystemTime::now(),
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<CatalogIndex> {
        &self.index
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.index.snapshot().await
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let snapshot = self.snapshot().await;
        QueryEngine::execute(&snapshot, request)
    }

    /// Exact identity first, then a case-insensitive scan.
    pub async fn extension(&self, identity: &str) -> Option<Arc<ExtensionRecord>> {
        let snapshot = self.snapshot().await;
        snapshot.get(identity).cloned().or_else(|| {
            snapshot
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(identity))
                .map(|(_, record)| Arc::clone(record))
        })
    }

    /// Stops the scheduler and watcher tasks.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for CatalogEngine {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
