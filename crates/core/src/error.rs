use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// A required file is missing or empty. Per-extension, non-fatal.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Parse, encoding or version-string failure. Per-extension, non-fatal.
    #[error("Malformed {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
    /// The storage root could not be enumerated; the rebuild is aborted.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CatalogError::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error only concerns a single extension.
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound(_) | CatalogError::Malformed { .. }
        )
    }
}

impl From<vscmirror_ingest::IngestError> for CatalogError {
    fn from(err: vscmirror_ingest::IngestError) -> Self {
        CatalogError::Internal(err.to_string())
    }
}

impl From<CatalogError> for vscmirror_api::ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidQuery(msg) => vscmirror_api::ApiError::InvalidRequest(msg),
            CatalogError::NotFound(path) => {
                vscmirror_api::ApiError::NotFound(path.display().to_string())
            }
            other => vscmirror_api::ApiError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
