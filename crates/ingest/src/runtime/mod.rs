use std::sync::Arc;

use crate::error::IngestError;
use crate::traits::{CommitSink, Executor, ProgressObserver};
use crate::types::{FanOutStats, KernelConfig, WorkItem};

pub mod kernel;

pub use kernel::run_fanout;

pub type DynExecutor<P, Out> = Arc<dyn Executor<P, Out> + Send + Sync>;
pub type DynCommitSink<Out> = Arc<dyn CommitSink<Out> + Send + Sync>;
pub type DynProgressObserver = Arc<dyn ProgressObserver + Send + Sync>;

/// Owned bundle of kernel components, runnable from async code.
pub struct FanOut<P, Out>
where
    P: Send + 'static,
    Out: Send + 'static,
{
    pub executor: DynExecutor<P, Out>,
    pub sink: DynCommitSink<Out>,
    pub observer: DynProgressObserver,
    pub config: KernelConfig,
}

impl<P, Out> FanOut<P, Out>
where
    P: Send + 'static,
    Out: Send + 'static,
{
    pub fn new(
        executor: DynExecutor<P, Out>,
        sink: DynCommitSink<Out>,
        observer: DynProgressObserver,
        config: KernelConfig,
    ) -> Self {
        Self {
            executor,
            sink,
            observer,
            config,
        }
    }

    /// Run on the blocking pool so the async runtime keeps serving.
    pub async fn run(&self, items: Vec<WorkItem<P>>) -> Result<FanOutStats, IngestError> {
        let executor = Arc::clone(&self.executor);
        let sink = Arc::clone(&self.sink);
        let observer = Arc::clone(&self.observer);
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            kernel::run_fanout(items, executor, sink, observer, &config)
        })
        .await
        .map_err(|e| IngestError::Execution(format!("fan-out join failure: {e}")))?
    }
}
