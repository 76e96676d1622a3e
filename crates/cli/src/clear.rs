use tracing::info;
use vscmirror_api::CatalogLifecycle;
use vscmirror_core::MirrorConfig;

pub async fn run(config: MirrorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cache_file = config.cache_file.clone();
    let engine = vscmirror_runtime::build_default_engine(config);

    info!("Clearing catalog cache at: {}...", cache_file.display());
    engine.clear_cache().await?;
    println!("Cache cleared: {}", cache_file.display());
    Ok(())
}
