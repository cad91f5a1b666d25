//! cubefix-store: versioned resource store for fixture artifacts.
//!
//! Backed by [redb](https://docs.rs/redb). Every resource is a byte blob
//! addressed by an absolute path (`/data/DEFAULT.FACT.csv`) and stamped
//! with a last-modified time in epoch milliseconds.
//!
//! # Architecture
//!
//! Content and stamps live in two tables keyed by the same path and are
//! always written in one transaction. Descriptors are JSON resources read
//! through [`MetadataManager`].
//!
//! The `ResourceStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`).

pub mod error;
pub mod metadata;
pub mod store;
pub mod tables;

pub use error::{StoreError, StoreResult};
pub use metadata::MetadataManager;
pub use store::{RawResource, ResourceStore, now_millis};
