use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Item-level failure; absorbed by the kernel.
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("commit failed: {0}")]
    Commit(String),
    #[error("worker pool failed: {0}")]
    Pool(String),
}
