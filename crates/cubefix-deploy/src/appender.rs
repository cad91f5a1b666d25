//! Fact-table appender.
//!
//! Appends CSV rows to the blob stored for a table, keeping whatever was
//! there before. The read and the replacement are tied together by the
//! stored stamp: if another writer touched the blob in between, the
//! append fails with a write conflict instead of dropping their rows.

use cubefix_core::ResourcePath;
use cubefix_store::{ResourceStore, now_millis};
use tracing::info;

use crate::error::DeployResult;

/// What an append did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub path: ResourcePath,
    pub previous_bytes: usize,
    pub appended_bytes: usize,
    /// Stamp the merged blob was stored with.
    pub timestamp: u64,
}

#[derive(Clone)]
pub struct FactTableAppender {
    store: ResourceStore,
}

impl FactTableAppender {
    pub fn new(store: ResourceStore) -> Self {
        Self { store }
    }

    /// Append `content` to `/data/<TABLE>.csv`. Bytes are concatenated
    /// as-is, old then new, with no separator added.
    pub fn append(&self, content: &str, table: &str) -> DeployResult<AppendOutcome> {
        let path = ResourcePath::data(table)?;
        let existing = self.store.get_resource(path.as_str())?;

        let (mut staged, expected) = match existing {
            Some(raw) => (raw.content, Some(raw.timestamp)),
            None => (Vec::new(), None),
        };
        let previous_bytes = staged.len();
        staged.extend_from_slice(content.as_bytes());

        // The stamp must move forward even within the same millisecond,
        // and pins at u64::MAX once there.
        let timestamp = match expected {
            Some(old) => now_millis().max(old.saturating_add(1)),
            None => now_millis(),
        };

        self.store
            .check_and_put_resource(path.as_str(), &staged, timestamp, expected)?;

        info!(
            %path,
            previous_bytes,
            appended_bytes = content.len(),
            timestamp,
            "fact table data appended"
        );
        Ok(AppendOutcome {
            path,
            previous_bytes,
            appended_bytes: content.len(),
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use cubefix_store::StoreError;

    fn content(store: &ResourceStore, table: &str) -> String {
        let path = ResourcePath::data(table).unwrap();
        let raw = store.get_resource(path.as_str()).unwrap().unwrap();
        String::from_utf8(raw.content).unwrap()
    }

    #[test]
    fn append_without_prior_blob_stores_content() {
        let store = ResourceStore::open_in_memory().unwrap();
        let appender = FactTableAppender::new(store.clone());

        let outcome = appender.append("1,2,3\n", "default.fact").unwrap();
        assert_eq!(outcome.previous_bytes, 0);
        assert_eq!(outcome.appended_bytes, 6);
        assert_eq!(outcome.path.as_str(), "/data/DEFAULT.FACT.csv");
        assert_eq!(content(&store, "default.fact"), "1,2,3\n");
    }

    #[test]
    fn append_concatenates_old_then_new() {
        let store = ResourceStore::open_in_memory().unwrap();
        store
            .put_resource("/data/DEFAULT.FACT.csv", b"1,2,3\n", 100)
            .unwrap();
        let appender = FactTableAppender::new(store.clone());

        let outcome = appender.append("4,5,6\n", "DEFAULT.FACT").unwrap();
        assert_eq!(outcome.previous_bytes, 6);
        assert!(outcome.timestamp > 100);
        assert_eq!(content(&store, "default.fact"), "1,2,3\n4,5,6\n");
    }

    #[test]
    fn append_adds_no_separator() {
        let store = ResourceStore::open_in_memory().unwrap();
        let appender = FactTableAppender::new(store.clone());
        appender.append("a", "t").unwrap();
        appender.append("b", "t").unwrap();
        assert_eq!(content(&store, "t"), "ab");
    }

    #[test]
    fn append_empty_content_creates_empty_blob() {
        let store = ResourceStore::open_in_memory().unwrap();
        let appender = FactTableAppender::new(store.clone());
        appender.append("", "t").unwrap();
        assert_eq!(content(&store, "t"), "");

        appender.append("x\n", "t").unwrap();
        appender.append("", "t").unwrap();
        assert_eq!(content(&store, "t"), "x\n");
    }

    #[test]
    fn stamp_advances_on_every_append() {
        let store = ResourceStore::open_in_memory().unwrap();
        let far_future = now_millis() + 60_000;
        store
            .put_resource("/data/DEFAULT.T.csv", b"", far_future)
            .unwrap();
        let appender = FactTableAppender::new(store.clone());

        let first = appender.append("a", "t").unwrap();
        let second = appender.append("b", "t").unwrap();
        assert_eq!(first.timestamp, far_future + 1);
        assert_eq!(second.timestamp, far_future + 2);
    }

    #[test]
    fn stamp_saturates_at_max() {
        let store = ResourceStore::open_in_memory().unwrap();
        store
            .put_resource("/data/DEFAULT.T.csv", b"x", u64::MAX)
            .unwrap();
        let appender = FactTableAppender::new(store.clone());

        let outcome = appender.append("y", "t").unwrap();
        assert_eq!(outcome.timestamp, u64::MAX);
        appender.append("z", "t").unwrap();
        assert_eq!(content(&store, "t"), "xyz");
    }

    #[test]
    fn bare_and_qualified_names_share_a_blob() {
        let store = ResourceStore::open_in_memory().unwrap();
        let appender = FactTableAppender::new(store.clone());

        let bare = appender.append("1\n", "t").unwrap();
        let qualified = appender.append("2\n", "default.t").unwrap();
        assert_eq!(bare.path, qualified.path);
        assert_eq!(qualified.previous_bytes, 2);
        assert_eq!(content(&store, "DEFAULT.T"), "1\n2\n");
        assert_eq!(store.list_resources("/data/").unwrap(), vec!["/data/DEFAULT.T.csv"]);
    }

    #[test]
    fn invalid_table_name_is_rejected() {
        let store = ResourceStore::open_in_memory().unwrap();
        let appender = FactTableAppender::new(store.clone());
        let err = appender.append("x", "../escape").unwrap_err();
        assert!(matches!(err, DeployError::Path(_)));
        assert!(store.list_resources("").unwrap().is_empty());
    }

    #[test]
    fn conflicting_writer_is_detected() {
        let store = ResourceStore::open_in_memory().unwrap();
        store.put_resource("/data/DEFAULT.T.csv", b"base\n", 10).unwrap();

        // Simulate a writer slipping in between our read and our put.
        let raw = store.get_resource("/data/DEFAULT.T.csv").unwrap().unwrap();
        store.put_resource("/data/DEFAULT.T.csv", b"base\nother\n", 11).unwrap();
        let err = store
            .check_and_put_resource("/data/DEFAULT.T.csv", b"base\nmine\n", 12, Some(raw.timestamp))
            .unwrap_err();
        assert!(matches!(err, StoreError::WriteConflict { .. }));

        // A fresh append sees the other writer's rows and keeps them.
        FactTableAppender::new(store.clone()).append("mine\n", "t").unwrap();
        assert_eq!(content(&store, "t"), "base\nother\nmine\n");
    }
}
