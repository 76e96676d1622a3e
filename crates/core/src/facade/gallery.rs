use crate::facade::EngineHandle;
use async_trait::async_trait;
use std::sync::Arc;
use vscmirror_api::models::{CatalogStatus, ExtensionRecord, QueryRequest, QueryResponse};
use vscmirror_api::{ApiResult, GalleryService};

#[async_trait]
impl GalleryService for EngineHandle {
    async fn query(&self, request: &QueryRequest) -> ApiResult<QueryResponse> {
        Ok(self.engine.query(request).await?)
    }

    async fn extension(&self, identity: &str) -> ApiResult<Option<Arc<ExtensionRecord>>> {
        Ok(self.engine.extension(identity).await)
    }

    async fn status(&self) -> ApiResult<CatalogStatus> {
        Ok(self.engine.status().await)
    }
}
