/// Upper bound on the worker pool regardless of core count.
pub const MAX_WORKERS: usize = 32;

/// `min(32, cpus + 4)`: loads are mostly file I/O, so oversubscribe a little.
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 4).min(MAX_WORKERS)
}

#[derive(Debug, Clone)]
pub struct WorkItem<P> {
    pub label: String,
    pub payload: P,
}

impl<P> WorkItem<P> {
    pub fn new(label: impl Into<String>, payload: P) -> Self {
        Self {
            label: label.into(),
            payload,
        }
    }
}

#[derive(Clone, Debug)]
pub struct KernelConfig {
    pub max_workers: usize,
    pub commit_batch_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_workers: default_worker_count(),
            commit_batch_size: 100,
        }
    }
}

impl KernelConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.clamp(1, MAX_WORKERS);
        self
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOutStats {
    pub submitted: usize,
    pub completed: usize,
    pub produced: usize,
    pub skipped: usize,
    pub failed: usize,
    pub committed_batches: usize,
}
