//! Environment preparation: scratch directories and baseline metadata.

use std::path::PathBuf;
use std::sync::Arc;

use cubefix_core::config::EnvConfig;
use cubefix_store::{MetadataManager, now_millis};
use tracing::info;

use crate::error::{DeployError, DeployResult};
use crate::executor::{CommandExecutor, shell_quote};

/// Counts from a metadata deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataReport {
    pub removed: usize,
    pub copied: usize,
    /// Cube descriptors whose signature was recomputed.
    pub resigned_cubes: Vec<String>,
}

pub struct EnvironmentPreparer {
    executor: Arc<dyn CommandExecutor>,
    metadata: MetadataManager,
    env: EnvConfig,
    snapshot_dir: Option<PathBuf>,
}

impl EnvironmentPreparer {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        metadata: MetadataManager,
        env: EnvConfig,
        snapshot_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            executor,
            metadata,
            env,
            snapshot_dir,
        }
    }

    /// Wipe the CLI working directory and recreate the job log directory.
    pub fn init_cli_work_dir(&self) -> DeployResult<()> {
        let work_dir = self.env.cli_working_dir.display().to_string();
        let log_dir = self.env.job_log_dir.display().to_string();
        self.executor
            .execute(&format!("rm -rf {}", shell_quote(&work_dir)))?;
        self.executor
            .execute(&format!("mkdir -p {}", shell_quote(&log_dir)))?;
        info!(%work_dir, %log_dir, "cli working directory initialized");
        Ok(())
    }

    /// Reset the store to the reference snapshot and re-sign every cube
    /// descriptor against it.
    pub fn deploy_metadata(&self) -> DeployResult<MetadataReport> {
        let snapshot = self
            .snapshot_dir
            .as_deref()
            .ok_or(DeployError::MissingSnapshot)?;
        let store = self.metadata.store();

        let removed = store.reset()?;
        let copied = store.copy_from_dir(snapshot, now_millis())?;

        let mut resigned_cubes = Vec::new();
        for cube in self.metadata.list_all_cubes()? {
            let desc = self.metadata.get_cube_desc_for(&cube)?;
            self.metadata.update_cube_desc(&desc)?;
            resigned_cubes.push(desc.name);
        }

        info!(
            snapshot = %snapshot.display(),
            removed,
            copied,
            cubes = resigned_cubes.len(),
            "metadata deployed"
        );
        Ok(MetadataReport {
            removed,
            copied,
            resigned_cubes,
        })
    }
}
