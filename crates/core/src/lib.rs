pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod util;

pub mod facade;
pub mod features;
pub mod indexing;
pub mod model;
pub mod runtime;

pub use config::{MirrorConfig, WatchMode};
pub use error::{CatalogError, Result};
pub use facade::EngineHandle;
pub use model::CatalogSnapshot;
pub use runtime::CatalogEngine;
