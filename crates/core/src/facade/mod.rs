use std::sync::Arc;

use crate::config::MirrorConfig;
use crate::model::CatalogSnapshot;
use crate::runtime::CatalogEngine as InternalEngine;

mod gallery;
mod lifecycle;

/// Engine handle - unified interface for all clients
///
/// Cheap to clone; every clone talks to the same engine.
#[derive(Clone)]
pub struct EngineHandle {
    pub(crate) engine: Arc<InternalEngine>,
}

impl EngineHandle {
    pub fn new(config: MirrorConfig) -> Self {
        Self {
            engine: Arc::new(InternalEngine::new(config)),
        }
    }

    /// Create a handle from an existing engine (useful for testing)
    pub fn from_engine(engine: Arc<InternalEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<InternalEngine> {
        &self.engine
    }

    /// Current snapshot, without waiting on any rebuild.
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.engine.snapshot().await
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vscmirror_api::models::{QueryRequest, ServiceState};
    use vscmirror_api::{CatalogLifecycle, GalleryService};

    fn handle() -> (tempfile::TempDir, EngineHandle) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("extensions")).unwrap();
        let handle = EngineHandle::new(MirrorConfig::new(dir.path()).with_workers(2));
        (dir, handle)
    }

    #[tokio::test]
    async fn reports_loading_before_first_refresh() {
        let (_dir, handle) = handle();
        let status = handle.status().await.unwrap();
        assert_eq!(status.status, ServiceState::Loading);
        assert!(!status.loading_complete);
        assert_eq!(status.extensions.loaded_count, 0);
    }

    #[tokio::test]
    async fn invalid_query_maps_to_invalid_request() {
        let (_dir, handle) = handle();
        let err = handle.query(&QueryRequest::default()).await.unwrap_err();
        assert!(matches!(err, vscmirror_api::ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn empty_tree_still_publishes() {
        let (_dir, handle) = handle();
        handle.refresh().await.unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle.wait_loaded())
            .await
            .unwrap();
        assert_eq!(handle.status().await.unwrap().status, ServiceState::Ready);
    }
}
