//! redb table definitions for the resource store.
//!
//! Both tables are keyed by the absolute resource path.

use redb::TableDefinition;

/// Resource content.
pub const RESOURCES: TableDefinition<&str, &[u8]> = TableDefinition::new("resources");

/// Last-modified stamp (epoch millis) per resource.
pub const TIMESTAMPS: TableDefinition<&str, u64> = TableDefinition::new("timestamps");
