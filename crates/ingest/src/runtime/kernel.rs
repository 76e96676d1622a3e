use std::sync::Arc;
use std::sync::mpsc;

use tracing::warn;

use crate::error::IngestError;
use crate::traits::{CommitSink, Executor, ProgressObserver};
use crate::types::{FanOutStats, KernelConfig, WorkItem};

struct Completion<Out> {
    label: String,
    result: Result<Option<Out>, IngestError>,
}

/// Runs every item on a bounded rayon pool and feeds outputs to `sink` in batches.
///
/// Blocks the calling thread, which acts as the single collector: completions are
/// drained as they finish (not in submission order), counted, and coalesced into
/// batches of `commit_batch_size` before reaching the sink. Item failures are
/// reported to `observer` and absorbed. A sink error aborts the run.
pub fn run_fanout<P, Out, EX, C, PO>(
    items: Vec<WorkItem<P>>,
    executor: Arc<EX>,
    sink: Arc<C>,
    observer: Arc<PO>,
    config: &KernelConfig,
) -> Result<FanOutStats, IngestError>
where
    P: Send + 'static,
    Out: Send + 'static,
    EX: Executor<P, Out> + 'static + ?Sized,
    C: CommitSink<Out> + ?Sized,
    PO: ProgressObserver + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_workers.max(1))
        .thread_name(|i| format!("fanout-worker-{i}"))
        .panic_handler(|_| warn!("fan-out worker panicked; item dropped"))
        .build()
        .map_err(|e| IngestError::Pool(e.to_string()))?;

    let total = items.len();
    let batch_size = config.commit_batch_size.max(1);
    let mut stats = FanOutStats {
        submitted: total,
        ..FanOutStats::default()
    };

    let (tx, rx) = mpsc::channel::<Completion<Out>>();
    for item in items {
        let tx = tx.clone();
        let executor = Arc::clone(&executor);
        pool.spawn(move || {
            let result = executor.execute(&item);
            let _ = tx.send(Completion {
                label: item.label,
                result,
            });
        });
    }
    drop(tx);

    let mut batch = Vec::with_capacity(batch_size.min(total.max(1)));
    for completion in rx {
        stats.completed += 1;
        match completion.result {
            Ok(Some(out)) => {
                stats.produced += 1;
                batch.push(out);
            }
            Ok(None) => stats.skipped += 1,
            Err(err) => {
                stats.failed += 1;
                observer.observe_failure(&completion.label, &err);
            }
        }

        if batch.len() >= batch_size {
            sink.commit_batch(std::mem::take(&mut batch))?;
            stats.committed_batches += 1;
        }

        observer.observe_completed(stats.completed, total, &completion.label);
    }

    if !batch.is_empty() {
        sink.commit_batch(batch)?;
        stats.committed_batches += 1;
    }

    Ok(stats)
}
