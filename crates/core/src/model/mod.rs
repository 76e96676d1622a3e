pub mod snapshot;

pub use snapshot::CatalogSnapshot;

// Re-export record types from the API layer for internal use
pub use vscmirror_api::models::{AssetFile, ExtensionRecord, ExtensionStats, VersionRecord};
