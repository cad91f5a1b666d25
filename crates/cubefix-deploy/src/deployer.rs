//! Warehouse table deployer.
//!
//! Stages each table's CSV blob to a local directory, recreates the
//! tables from their descriptors, bulk-loads the staged files, and
//! finally recreates the configured views. Statements run one batch at a
//! time; a failure part-way leaves earlier tables in place.

use std::path::Path;
use std::sync::Arc;

use cubefix_core::config::{FixtureSection, ViewConfig, WarehouseConfig};
use cubefix_core::path::{DEFAULT_DATABASE, normalize_table_name};
use cubefix_core::ResourcePath;
use cubefix_store::MetadataManager;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{DeployError, DeployResult};
use crate::executor::CommandExecutor;
use crate::hive::{HiveCmdBuilder, WarehouseClient};
use crate::hql;

/// Summary of a finished deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Normalized table identities, in deployment order.
    pub tables: Vec<String>,
    pub views: Vec<String>,
    pub staged_bytes: u64,
}

pub struct WarehouseTableDeployer {
    metadata: MetadataManager,
    warehouse: Arc<dyn WarehouseClient>,
    executor: Arc<dyn CommandExecutor>,
    warehouse_config: WarehouseConfig,
    tables: Vec<String>,
    views: Vec<ViewConfig>,
}

impl WarehouseTableDeployer {
    pub fn new(
        metadata: MetadataManager,
        warehouse: Arc<dyn WarehouseClient>,
        executor: Arc<dyn CommandExecutor>,
        warehouse_config: WarehouseConfig,
        fixture: &FixtureSection,
    ) -> Self {
        Self {
            metadata,
            warehouse,
            executor,
            warehouse_config,
            tables: fixture.tables.clone(),
            views: fixture.views.clone(),
        }
    }

    /// Deploy every configured table, then every configured view.
    pub fn deploy(&self) -> DeployResult<DeployReport> {
        let tables = self
            .tables
            .iter()
            .map(|t| normalize_table_name(t))
            .collect::<Result<Vec<_>, _>>()?;

        let staging = tempfile::Builder::new().prefix("cubefix-stage-").tempdir()?;
        let staged_bytes = self.stage_tables(&tables, &staging)?;

        for database in distinct_databases(&tables) {
            self.warehouse
                .execute_statement(&hql::create_database_hql(&database))?;
        }

        for table in &tables {
            let desc = self.metadata.get_table_desc(table)?;
            self.warehouse.execute_hql(&hql::create_table_hql(&desc))?;
            debug!(%table, "table created");
        }

        for table in &tables {
            self.warehouse
                .execute_statement(&hql::load_data_hql(table, staging.path()))?;
            debug!(%table, "table loaded");
        }

        let views = self.create_views()?;

        info!(
            tables = tables.len(),
            views = views.len(),
            staged_bytes,
            "warehouse tables deployed"
        );
        Ok(DeployReport {
            tables,
            views,
            staged_bytes,
        })
    }

    /// Copy `/data/<TABLE>.csv` for every table into `dir`.
    fn stage_tables(&self, tables: &[String], dir: &TempDir) -> DeployResult<u64> {
        let store = self.metadata.store();
        let mut total = 0u64;
        for table in tables {
            let path = ResourcePath::data(table)?;
            let raw = store
                .get_resource(path.as_str())?
                .ok_or_else(|| DeployError::MissingTableData(table.clone()))?;
            let local = staged_file(dir.path(), table);
            std::fs::write(&local, &raw.content)?;
            total += raw.content.len() as u64;
            debug!(%table, local = %local.display(), bytes = raw.content.len(), "table data staged");
        }
        Ok(total)
    }

    /// Views go out as one warehouse CLI command through the executor.
    fn create_views(&self) -> DeployResult<Vec<String>> {
        if self.views.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = HiveCmdBuilder::new(&self.warehouse_config);
        let mut names = Vec::new();
        for view in &self.views {
            let name = normalize_table_name(&view.name)?;
            let table = normalize_table_name(&view.table)?;
            builder.add_statements(&hql::create_view_hql(&name, &table));
            names.push(name);
        }
        let cmd = builder.build()?;
        self.executor.execute(&cmd.command)?;
        Ok(names)
    }
}

fn staged_file(dir: &Path, table: &str) -> std::path::PathBuf {
    dir.join(format!("{table}.csv"))
}

/// Non-default databases named by `tables`, in first-seen order.
fn distinct_databases(tables: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for table in tables {
        if let Some((db, _)) = table.split_once('.') {
            if db != DEFAULT_DATABASE && !seen.iter().any(|s| s == db) {
                seen.push(db.to_string());
            }
        }
    }
    seen
}
