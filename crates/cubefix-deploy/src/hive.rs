//! Warehouse command line rendering and the warehouse client seam.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cubefix_core::config::{WarehouseClientKind, WarehouseConfig};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::DeployResult;
use crate::executor::{CommandExecutor, shell_quote};

/// A rendered warehouse invocation.
///
/// In beeline mode the statements live in a script file. Unless
/// `keep_scripts` is set, the file is removed when this value drops, so
/// keep it alive until the command has run.
#[derive(Debug)]
pub struct HiveCommand {
    pub command: String,
    script: Option<Script>,
}

#[derive(Debug)]
enum Script {
    Temp(NamedTempFile),
    Kept(PathBuf),
}

impl HiveCommand {
    pub fn script_path(&self) -> Option<&Path> {
        match self.script.as_ref()? {
            Script::Temp(file) => Some(file.path()),
            Script::Kept(path) => Some(path.as_path()),
        }
    }
}

/// Accumulates statements and renders one `hive -e` or `beeline -f` call.
#[derive(Debug, Clone)]
pub struct HiveCmdBuilder {
    config: WarehouseConfig,
    statements: Vec<String>,
}

impl HiveCmdBuilder {
    pub fn new(config: &WarehouseConfig) -> Self {
        Self {
            config: config.clone(),
            statements: Vec::new(),
        }
    }

    /// Add a statement. A trailing `;` is added if missing.
    pub fn add_statement(&mut self, statement: &str) -> &mut Self {
        let trimmed = statement.trim_end();
        if trimmed.is_empty() {
            return self;
        }
        if trimmed.ends_with(';') {
            self.statements.push(trimmed.to_string());
        } else {
            self.statements.push(format!("{trimmed};"));
        }
        self
    }

    pub fn add_statements<S: AsRef<str>>(&mut self, statements: &[S]) -> &mut Self {
        for s in statements {
            self.add_statement(s.as_ref());
        }
        self
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn build(&self) -> DeployResult<HiveCommand> {
        let script = self.statements.join("\n");
        match self.config.client {
            WarehouseClientKind::Cli => {
                let escaped = script
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('$', "\\$")
                    .replace('`', "\\`");
                Ok(HiveCommand {
                    command: format!("{} -e \"{escaped}\"", self.config.hive_command),
                    script: None,
                })
            }
            WarehouseClientKind::Beeline => {
                let mut file = tempfile::Builder::new()
                    .prefix("cubefix-")
                    .suffix(".hql")
                    .tempfile()?;
                file.write_all(script.as_bytes())?;
                file.flush()?;
                let path = file.path().display().to_string();
                let params = self.config.beeline_params.as_deref().unwrap_or_default();
                let command = if params.is_empty() {
                    format!("beeline -f {}", shell_quote(&path))
                } else {
                    format!("beeline {params} -f {}", shell_quote(&path))
                };
                let script = if self.config.keep_scripts {
                    let (_, path) = file.keep().map_err(|e| e.error)?;
                    debug!(path = %path.display(), "beeline script kept");
                    Script::Kept(path)
                } else {
                    Script::Temp(file)
                };
                Ok(HiveCommand {
                    command,
                    script: Some(script),
                })
            }
        }
    }
}

/// Executes batches of warehouse statements.
pub trait WarehouseClient: Send + Sync {
    /// Run `statements` in order as one batch.
    fn execute_hql(&self, statements: &[String]) -> DeployResult<()>;

    fn execute_statement(&self, statement: &str) -> DeployResult<()> {
        self.execute_hql(&[statement.to_string()])
    }
}

/// Warehouse client that shells out to the hive or beeline CLI.
pub struct CliWarehouseClient {
    executor: Arc<dyn CommandExecutor>,
    config: WarehouseConfig,
}

impl CliWarehouseClient {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: WarehouseConfig) -> Self {
        Self { executor, config }
    }
}

impl WarehouseClient for CliWarehouseClient {
    fn execute_hql(&self, statements: &[String]) -> DeployResult<()> {
        let mut builder = HiveCmdBuilder::new(&self.config);
        builder.add_statements(statements);
        let cmd = builder.build()?;
        debug!(statements = statements.len(), "executing hql batch");
        self.executor.execute(&cmd.command)?;
        Ok(())
    }
}
