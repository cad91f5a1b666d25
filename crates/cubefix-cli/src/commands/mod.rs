pub mod append;
pub mod deploy;
pub mod env;
pub mod generate;
pub mod init;
pub mod prepare;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use cubefix_core::FixtureConfig;
use cubefix_deploy::{CommandExecutor, Fixture, RecordingExecutor, ShellExecutor};
use cubefix_store::ResourceStore;
use tracing::debug;

pub const CONFIG_FILE: &str = "cubefix.toml";

/// Loaded configuration plus the fixture wired to it.
pub struct Session {
    pub fixture: Fixture,
    recorder: Option<Arc<RecordingExecutor>>,
}

impl Session {
    pub fn open(config_path: Option<&Path>, dry_run: bool) -> Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .or_else(|| {
                let local = PathBuf::from(CONFIG_FILE);
                local.is_file().then_some(local)
            });
        let mut config = FixtureConfig::load(config_path.as_deref()).with_context(|| {
            format!(
                "loading {}",
                config_path.as_deref().unwrap_or(Path::new(CONFIG_FILE)).display()
            )
        })?;

        let store = ResourceStore::open(&config.store.path)
            .with_context(|| format!("opening store {}", config.store.path.display()))?;

        let (executor, recorder) = if dry_run {
            config.warehouse.keep_scripts = true;
            let recorder = Arc::new(RecordingExecutor::new());
            let executor: Arc<dyn CommandExecutor> = recorder.clone();
            (executor, Some(recorder))
        } else {
            let executor: Arc<dyn CommandExecutor> = Arc::new(ShellExecutor::new());
            (executor, None)
        };
        debug!(store = %config.store.path.display(), dry_run, "session opened");

        Ok(Self {
            fixture: Fixture::new(config, store, executor),
            recorder,
        })
    }

    /// In dry-run mode, print every command that would have run.
    pub fn print_recorded(&self) {
        if let Some(recorder) = &self.recorder {
            let commands = recorder.commands();
            if commands.is_empty() {
                return;
            }
            println!("Commands (dry run):");
            for command in commands {
                println!("  {command}");
            }
        }
    }
}
