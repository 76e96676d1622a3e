use super::EngineHandle;
use async_trait::async_trait;
use std::sync::Arc;
use vscmirror_api::{ApiResult, CatalogLifecycle, RefreshOutcome, RefreshTrigger};

#[async_trait]
impl CatalogLifecycle for EngineHandle {
    async fn refresh(&self) -> ApiResult<RefreshOutcome> {
        Ok(self.engine.refresh().await?)
    }

    async fn rebuild(&self) -> ApiResult<RefreshOutcome> {
        Ok(self.engine.rebuild().await?)
    }

    async fn load(&self) -> ApiResult<bool> {
        Ok(self.engine.load().await?)
    }

    async fn save(&self) -> ApiResult<()> {
        Ok(self.engine.save().await?)
    }

    async fn start_scheduler(&self) -> ApiResult<Arc<dyn RefreshTrigger>> {
        let handle: Arc<dyn RefreshTrigger> = self.engine.start_scheduler()?;
        Ok(handle)
    }

    async fn wait_loaded(&self) {
        self.engine.index().wait_loaded().await
    }

    async fn clear_cache(&self) -> ApiResult<()> {
        if self.engine.clear_cache().await? {
            tracing::info!("Removed cache {}", self.engine.cache().path().display());
        }
        Ok(())
    }
}
