pub mod config;
pub mod path;
pub mod types;

pub use config::FixtureConfig;
pub use path::{PathError, ResourcePath};
pub use types::*;
