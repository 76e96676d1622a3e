pub mod error;
pub mod runtime;
pub mod traits;
pub mod types;

pub use error::IngestError;
pub use runtime::{DynCommitSink, DynExecutor, DynProgressObserver, FanOut, run_fanout};
pub use traits::{CommitSink, Executor, ProgressObserver};
pub use types::{FanOutStats, KernelConfig, WorkItem, default_worker_count};
