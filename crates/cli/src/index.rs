use tracing::info;
use vscmirror_api::{CatalogLifecycle, GalleryService, RefreshOutcome};
use vscmirror_core::MirrorConfig;

pub async fn run(config: MirrorConfig, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let root = config.extensions_root.clone();
    let cache_file = config.cache_file.clone();
    let engine = vscmirror_runtime::build_default_engine(config);

    info!("Indexing extensions at: {}...", root.display());
    let outcome = if force {
        engine.rebuild().await?
    } else {
        engine.refresh().await?
    };

    match outcome {
        RefreshOutcome::LoadedFromCache { extensions } => {
            println!("Cache is current: {} extensions ({})", extensions, cache_file.display());
        }
        RefreshOutcome::Rebuilt { extensions } => {
            println!("Indexed {} extensions, cache written to {}", extensions, cache_file.display());
        }
        RefreshOutcome::Skipped => println!("Another refresh is already running."),
    }

    let status = engine.status().await?;
    let summary = &status.extensions;
    println!("Versions:    {}", summary.total_versions);
    println!("Publishers:  {}", summary.unique_publishers);
    println!("Recommended: {}", summary.recommended_count);
    for category in &summary.top_categories {
        info!(" - {} ({})", category.name, category.count);
    }

    Ok(())
}
