pub mod extension;
pub mod query;
pub mod status;

pub use extension::*;
pub use query::*;
pub use status::*;
