//! Shell command execution.
//!
//! [`ShellExecutor`] runs commands through `sh -c` and blocks until they
//! finish. [`RecordingExecutor`] only records what would run, which the
//! CLI uses for `--dry-run` and tests use to assert statement order.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{DeployError, DeployResult};

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Synchronous command runner. A non-zero exit is an error.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str) -> DeployResult<CommandOutput>;
}

/// Runs commands with `sh -c`, optionally from a fixed working directory.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    working_dir: Option<PathBuf>,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str) -> DeployResult<CommandOutput> {
        info!(%command, "executing");
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|source| DeployError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(DeployError::CommandFailed {
                command: command.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        debug!(%command, stdout_bytes = stdout.len(), "command finished");
        Ok(CommandOutput {
            code: output.status.code().unwrap_or(0),
            stdout,
            stderr,
        })
    }
}

/// Records commands instead of running them.
///
/// `fail_on` makes any command containing the given text fail, after it
/// has been recorded.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    commands: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(pattern: impl Into<String>) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_on: Some(pattern.into()),
        }
    }

    /// Everything executed so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, command: &str) -> DeployResult<CommandOutput> {
        debug!(%command, "recorded");
        match self.commands.lock() {
            Ok(mut c) => c.push(command.to_string()),
            Err(poisoned) => poisoned.into_inner().push(command.to_string()),
        }
        if let Some(pattern) = &self.fail_on {
            if command.contains(pattern.as_str()) {
                return Err(DeployError::CommandFailed {
                    command: command.to_string(),
                    code: Some(1),
                    stderr: format!("simulated failure on {pattern:?}"),
                });
            }
        }
        Ok(CommandOutput::default())
    }
}

/// Single-quote `arg` for `sh`.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_executor_captures_stdout() {
        let out = ShellExecutor::new().execute("printf hello").unwrap();
        assert_eq!(out.stdout, "hello");
        assert_eq!(out.code, 0);
    }

    #[test]
    fn test_shell_executor_non_zero_exit_fails() {
        let err = ShellExecutor::new()
            .execute("echo boom >&2; exit 3")
            .unwrap_err();
        match err {
            DeployError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shell_executor_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let out = ShellExecutor::with_working_dir(dir.path())
            .execute("ls")
            .unwrap();
        assert!(out.stdout.contains("marker"));
    }

    #[test]
    fn test_recording_executor_keeps_order() {
        let exec = RecordingExecutor::new();
        exec.execute("first").unwrap();
        exec.execute("second").unwrap();
        assert_eq!(exec.commands(), vec!["first", "second"]);
    }

    #[test]
    fn test_recording_executor_simulated_failure() {
        let exec = RecordingExecutor::failing_on("LOAD DATA");
        exec.execute("CREATE TABLE x").unwrap();
        assert!(exec.execute("LOAD DATA LOCAL INPATH 'x'").is_err());
        assert_eq!(exec.commands().len(), 2);
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/tmp/a b"), "'/tmp/a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
