pub mod error;
pub mod gallery;
pub mod lifecycle;
pub mod models;

// Re-export commonly used types
pub use error::{ApiError, ApiResult};
pub use gallery::GalleryService;
pub use lifecycle::{CatalogLifecycle, RefreshOutcome, RefreshTrigger};
pub use models::*;

/// Composite trait representing the full mirror engine API.
/// Serving layers depend on this single trait instead of the individual services.
pub trait MirrorEngine: GalleryService + CatalogLifecycle {}

impl<T> MirrorEngine for T where T: GalleryService + CatalogLifecycle {}
