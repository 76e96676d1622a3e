use tracing::info;
use vscmirror_api::{CatalogLifecycle, GalleryService};
use vscmirror_core::MirrorConfig;

pub async fn run(config: MirrorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let root = config.extensions_root.clone();
    let engine = vscmirror_runtime::build_default_engine(config);

    info!("Starting refresh scheduler for {}...", root.display());
    let scheduler = engine.start_scheduler().await?;

    engine.wait_loaded().await;
    let status = engine.status().await?;
    info!(
        "Catalog ready: {} extensions. Press Ctrl+C to stop.",
        status.extensions.loaded_count
    );

    tokio::signal::ctrl_c().await?;
    scheduler.stop();
    info!("Scheduler stopped.");

    Ok(())
}
