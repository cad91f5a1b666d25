//! cubefix.toml configuration parser.
//!
//! A single [`FixtureConfig`] is built once and handed to every component
//! that needs environment settings. Nothing reads configuration from
//! process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tables the stock fixture deploys, in deployment order.
pub const DEFAULT_TABLES: &[&str] = &[
    "edw.test_cal_dt",
    "default.test_order",
    "default.test_category_groupings",
    "default.test_kylin_fact",
    "edw.test_seller_type_dim_table",
    "edw.test_sites",
    "default.test_account",
    "default.test_country",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureConfig {
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub fixture: FixtureSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Scratch directory wiped by `init_cli_work_dir`.
    pub cli_working_dir: PathBuf,
    pub job_log_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// redb file backing the resource store.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Reference metadata tree copied into the store by `deploy_metadata`.
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseClientKind {
    #[default]
    Cli,
    Beeline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub client: WarehouseClientKind,
    /// Program invoked in CLI mode.
    pub hive_command: String,
    /// Extra arguments for beeline, e.g. `-n root -u 'jdbc:hive2://localhost:10000'`.
    pub beeline_params: Option<String>,
    /// Leave beeline scripts on disk after the command is built.
    pub keep_scripts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewConfig {
    pub name: String,
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSection {
    pub tables: Vec<String>,
    pub views: Vec<ViewConfig>,
    /// Row target handed to the model data generator.
    pub generated_rows: u32,
    pub seed: u64,
    /// JSON field carrying the event time in streaming records.
    pub stream_timestamp_field: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            cli_working_dir: PathBuf::from("/tmp/cubefix"),
            job_log_dir: PathBuf::from("/tmp/cubefix/logs"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("cubefix.redb"),
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        WarehouseConfig {
            client: WarehouseClientKind::Cli,
            hive_command: "hive".to_string(),
            beeline_params: None,
            keep_scripts: false,
        }
    }
}

impl Default for FixtureSection {
    fn default() -> Self {
        FixtureSection {
            tables: DEFAULT_TABLES.iter().map(|t| t.to_string()).collect(),
            views: vec![ViewConfig {
                name: "edw.test_seller_type_dim".to_string(),
                table: "edw.test_seller_type_dim_table".to_string(),
            }],
            generated_rows: 10_000,
            seed: 0,
            stream_timestamp_field: "timestamp".to_string(),
        }
    }
}

impl FixtureConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FixtureConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a config rooted at `base_dir`.
    pub fn scaffold(base_dir: &Path) -> Self {
        FixtureConfig {
            env: EnvConfig {
                cli_working_dir: base_dir.join("work"),
                job_log_dir: base_dir.join("work").join("logs"),
            },
            store: StoreConfig {
                path: base_dir.join("cubefix.redb"),
            },
            metadata: MetadataConfig {
                snapshot_dir: Some(base_dir.join("sample_meta")),
            },
            warehouse: WarehouseConfig::default(),
            fixture: FixtureSection::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold() {
        let config = FixtureConfig::scaffold(Path::new("/srv/fixture"));
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("/srv/fixture/work"));
        assert!(toml_str.contains("test_kylin_fact"));
    }

    #[test]
    fn test_parse_minimal() {
        let config: FixtureConfig = toml::from_str("").unwrap();
        assert_eq!(config.fixture.tables.len(), DEFAULT_TABLES.len());
        assert_eq!(config.fixture.generated_rows, 10_000);
        assert_eq!(config.warehouse.client, WarehouseClientKind::Cli);
    }

    #[test]
    fn test_parse_overrides() {
        let toml_str = r#"
[env]
cli_working_dir = "/data/work"
job_log_dir = "/data/work/logs"

[warehouse]
client = "beeline"
hive_command = "hive"
beeline_params = "-u 'jdbc:hive2://localhost:10000'"

[fixture]
tables = ["default.fact"]
views = []
generated_rows = 50
seed = 7
stream_timestamp_field = "ts"
"#;
        let config: FixtureConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.env.cli_working_dir, PathBuf::from("/data/work"));
        assert_eq!(config.warehouse.client, WarehouseClientKind::Beeline);
        assert_eq!(config.fixture.tables, vec!["default.fact".to_string()]);
        assert!(config.fixture.views.is_empty());
        assert_eq!(config.fixture.stream_timestamp_field, "ts");
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = FixtureConfig::load(None).unwrap();
        assert_eq!(config.fixture.views[0].name, "edw.test_seller_type_dim");
    }
}
