pub mod builder;
pub mod loader;
pub mod scanner;
pub mod version;

pub use builder::CatalogBuilder;
pub use loader::MetadataLoader;
pub use scanner::Scanner;

/// Canonical description of an extension, newest version first.
pub const LATEST_FILE: &str = "latest.json";
/// Description stored inside each version subdirectory.
pub const VERSION_FILE: &str = "extension.json";
/// Touched by the sync process whenever an extension changes.
pub const UPDATE_MARKER: &str = "updated.json";

use std::path::Path;

/// Whether a changed path should cause a refresh.
pub fn is_update_marker(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == UPDATE_MARKER)
}
