use crate::error::ApiResult;
use crate::models::{CatalogStatus, ExtensionRecord, QueryRequest, QueryResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// Read side of the mirror: everything a gallery endpoint needs.
///
/// Implementations answer from the last published snapshot and never wait for an
/// in-flight rebuild.
#[async_trait]
pub trait GalleryService: Send + Sync {
    /// Evaluate a marketplace `extensionquery` request.
    async fn query(&self, request: &QueryRequest) -> ApiResult<QueryResponse>;

    /// Look up one extension by identity (`publisher.name`, case-insensitive).
    async fn extension(&self, identity: &str) -> ApiResult<Option<Arc<ExtensionRecord>>>;

    /// Loading/indexing/refresh report.
    async fn status(&self) -> ApiResult<CatalogStatus>;
}
