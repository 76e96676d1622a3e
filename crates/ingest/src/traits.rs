use crate::error::IngestError;
use crate::types::WorkItem;

/// Processes one work item on a pool thread.
///
/// `Ok(None)` means the item produced nothing; `Err` is counted as a failure.
/// Neither stops the run.
pub trait Executor<P, Out>: Send + Sync {
    fn execute(&self, item: &WorkItem<P>) -> Result<Option<Out>, IngestError>;
}

/// Receives outputs in coalesced batches on the collecting thread.
pub trait CommitSink<Out>: Send + Sync {
    fn commit_batch(&self, batch: Vec<Out>) -> Result<usize, IngestError>;
}

pub trait ProgressObserver: Send + Sync {
    fn observe_completed(&self, completed: usize, total: usize, label: &str);
    fn observe_failure(&self, label: &str, error: &IngestError);
}
