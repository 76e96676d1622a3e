use std::sync::Arc;
use vscmirror_api::{ApiError, ApiResult, MirrorEngine};
use vscmirror_core::{EngineHandle, MirrorConfig};

pub use vscmirror_core::config::WatchMode;

/// Assembles the catalog engine for a resolved configuration.
///
/// Serving layers hold the result as `dyn MirrorEngine` and never see the core types.
pub fn build_default_engine(config: MirrorConfig) -> Arc<dyn MirrorEngine> {
    tracing::debug!(
        "Building engine for {} (cache {})",
        config.extensions_root.display(),
        config.cache_file.display()
    );
    Arc::new(EngineHandle::new(config))
}

/// Resolves the configuration from the environment and refuses to build an engine
/// without an extensions directory.
pub fn build_engine_from_env() -> ApiResult<Arc<dyn MirrorEngine>> {
    let config = load_config()?;
    Ok(build_default_engine(config))
}

/// Environment configuration, validated.
pub fn load_config() -> ApiResult<MirrorConfig> {
    let config = MirrorConfig::from_env().map_err(ApiError::from)?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &MirrorConfig) -> ApiResult<()> {
    config.validate().map_err(|e| {
        tracing::warn!("{}", e);
        ApiError::from(e)
    })
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> Option<impl Drop> {
    Some(vscmirror_core::logging::init_logging(component, to_stderr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vscmirror_api::models::ServiceState;
    use vscmirror_api::{CatalogLifecycle, GalleryService};

    #[tokio::test]
    async fn default_engine_serves_through_the_trait() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("extensions")).unwrap();
        let config = MirrorConfig::new(dir.path()).with_watch(WatchMode::Disabled);
        validate(&config).unwrap();

        let engine = build_default_engine(config);
        engine.refresh().await.unwrap();
        let status = engine.status().await.unwrap();
        assert_eq!(status.status, ServiceState::Ready);
    }

    #[test]
    fn missing_extensions_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = MirrorConfig::new(dir.path());
        assert!(matches!(validate(&config), Err(ApiError::Internal(_))));
    }
}
