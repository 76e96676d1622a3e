use super::loader::MetadataLoader;
use super::scanner::Scanner;
use crate::error::{CatalogError, Result};
use crate::model::CatalogSnapshot;
use crate::runtime::index::CatalogIndex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use vscmirror_api::models::{ExtensionRecord, IndexingStage};
use vscmirror_ingest::{
    CommitSink, Executor, FanOut, IngestError, KernelConfig, ProgressObserver, WorkItem,
};

const PROGRESS_LOG_EVERY: usize = 50;

/// Produces complete snapshots from the extension storage root.
pub struct CatalogBuilder {
    loader: Arc<MetadataLoader>,
    kernel: KernelConfig,
}

impl CatalogBuilder {
    pub fn new(loader: MetadataLoader, workers: usize) -> Self {
        Self {
            loader: Arc::new(loader),
            kernel: KernelConfig::default().with_workers(workers),
        }
    }

    /// Scans `root` and loads every eligible extension on the worker pool.
    ///
    /// Per-extension failures are logged and skipped. A root that cannot be listed
    /// fails the build. `index` only receives progress updates here; publishing the
    /// result is left to the caller.
    pub async fn build(&self, root: &Path, index: &Arc<CatalogIndex>) -> Result<CatalogSnapshot> {
        index.set_progress(IndexingStage::Scanning, 0, 0);
        let scan_root = root.to_path_buf();
        let dirs = tokio::task::spawn_blocking(move || Scanner::extension_dirs(&scan_root))
            .await
            .map_err(|e| CatalogError::Internal(e.to_string()))??;

        let total = dirs.len();
        index.set_progress(IndexingStage::Processing, 0, total);
        info!(
            "Processing {} extensions from {} with {} workers",
            total,
            root.display(),
            self.kernel.max_workers
        );

        let items: Vec<WorkItem<PathBuf>> = dirs
            .into_iter()
            .map(|dir| {
                let label = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| dir.display().to_string());
                WorkItem::new(label, dir)
            })
            .collect();

        let sink = Arc::new(AccumulatingSink::default());
        let fan_out = FanOut::new(
            Arc::new(LoadExecutor {
                loader: Arc::clone(&self.loader),
            }),
            sink.clone(),
            Arc::new(IndexProgressObserver {
                index: Arc::clone(index),
            }),
            self.kernel.clone(),
        );
        let stats = fan_out.run(items).await?;
        debug!(
            "Fan-out finished: {} loaded, {} skipped, {} failed, {} batches",
            stats.produced, stats.skipped, stats.failed, stats.committed_batches
        );

        Ok(CatalogSnapshot::new(sink.take()))
    }
}

struct LoadExecutor {
    loader: Arc<MetadataLoader>,
}

impl Executor<PathBuf, ExtensionRecord> for LoadExecutor {
    fn execute(&self, item: &WorkItem<PathBuf>) -> std::result::Result<Option<ExtensionRecord>, IngestError> {
        match self.loader.load(&item.payload) {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.is_item_level() => {
                debug!("Skipping extension {}: {}", item.label, err);
                Ok(None)
            }
            Err(err) => Err(IngestError::Execution(err.to_string())),
        }
    }
}

/// Accumulation map the fan-out commits batches into.
#[derive(Default)]
struct AccumulatingSink {
    extensions: Mutex<BTreeMap<String, Arc<ExtensionRecord>>>,
}

impl AccumulatingSink {
    fn take(&self) -> BTreeMap<String, Arc<ExtensionRecord>> {
        match self.extensions.lock() {
            Ok(mut map) => std::mem::take(&mut *map),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl CommitSink<ExtensionRecord> for AccumulatingSink {
    fn commit_batch(&self, batch: Vec<ExtensionRecord>) -> std::result::Result<usize, IngestError> {
        let size = batch.len();
        let mut map = self
            .extensions
            .lock()
            .map_err(|_| IngestError::Commit("accumulation map poisoned".to_string()))?;
        for record in batch {
            map.insert(record.identity.clone(), Arc::new(record));
        }
        Ok(size)
    }
}

struct IndexProgressObserver {
    index: Arc<CatalogIndex>,
}

impl ProgressObserver for IndexProgressObserver {
    fn observe_completed(&self, completed: usize, total: usize, label: &str) {
        self.index.advance(completed);
        if completed % PROGRESS_LOG_EVERY == 0 || completed == total {
            info!(
                "Processed {}/{} ({:.1}%) - Latest: {}",
                completed,
                total,
                completed as f64 * 100.0 / total.max(1) as f64,
                label
            );
        }
    }

    fn observe_failure(&self, label: &str, error: &IngestError) {
        warn!("Exception processing {}: {}", label, error);
    }
}
