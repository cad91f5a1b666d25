//! Resource path resolution.
//!
//! Every artifact in the resource store lives under a fixed root:
//! `/data/<TABLE>.csv` for table content, and one JSON resource per
//! descriptor under `/table`, `/model_desc`, `/cube_desc`, and `/cube`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

pub const DATA_ROOT: &str = "/data";
pub const TABLE_ROOT: &str = "/table";
pub const MODEL_DESC_ROOT: &str = "/model_desc";
pub const CUBE_DESC_ROOT: &str = "/cube_desc";
pub const CUBE_ROOT: &str = "/cube";

static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("static regex")
});

static RESOURCE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("static regex"));

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),
    #[error("invalid resource name: {0:?}")]
    InvalidResourceName(String),
}

/// Key of a blob in the resource store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(String);

pub const DEFAULT_DATABASE: &str = "DEFAULT";

/// Upper-case and validate a `[DB.]TABLE` name. A bare `TABLE` is
/// qualified as `DEFAULT.TABLE`.
pub fn normalize_table_name(name: &str) -> Result<String, PathError> {
    let trimmed = name.trim();
    if !TABLE_NAME.is_match(trimmed) {
        return Err(PathError::InvalidTableName(name.to_string()));
    }
    let upper = trimmed.to_uppercase();
    if upper.contains('.') {
        Ok(upper)
    } else {
        Ok(format!("{DEFAULT_DATABASE}.{upper}"))
    }
}

impl ResourcePath {
    /// `/data/<TABLE>.csv`
    pub fn data(table: &str) -> Result<Self, PathError> {
        let table = normalize_table_name(table)?;
        Ok(ResourcePath(format!("{DATA_ROOT}/{table}.csv")))
    }

    /// `/table/<DB.TABLE>.json`
    pub fn table_desc(table: &str) -> Result<Self, PathError> {
        let table = normalize_table_name(table)?;
        Ok(ResourcePath(format!("{TABLE_ROOT}/{table}.json")))
    }

    pub fn model_desc(name: &str) -> Result<Self, PathError> {
        Self::named(MODEL_DESC_ROOT, name)
    }

    pub fn cube_desc(name: &str) -> Result<Self, PathError> {
        Self::named(CUBE_DESC_ROOT, name)
    }

    pub fn cube(name: &str) -> Result<Self, PathError> {
        Self::named(CUBE_ROOT, name)
    }

    fn named(root: &str, name: &str) -> Result<Self, PathError> {
        if !RESOURCE_NAME.is_match(name) {
            return Err(PathError::InvalidResourceName(name.to_string()));
        }
        Ok(ResourcePath(format!("{root}/{name}.json")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
