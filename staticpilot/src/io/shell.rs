//! Execution port: run one shell command in a working directory.
//!
//! The [`Shell`] trait decouples the build loop from the OS shell. Tests use
//! scripted shells that return predetermined results without spawning processes.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::types::ExecutionResult;
use crate::io::config::BuildConfig;
use crate::io::process::run_captured;

/// Abstraction over command execution backends.
pub trait Shell {
    /// Run `command` with `workdir` as its working directory.
    ///
    /// A non-zero exit is a normal `Ok` result; `Err` means the command could
    /// not be run at all.
    fn run(&self, command: &str, workdir: &Path) -> Result<ExecutionResult>;
}

/// Shell that spawns `<program> -c <command>`.
#[derive(Debug, Clone)]
pub struct SystemShell {
    program: PathBuf,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl SystemShell {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>, output_limit_bytes: usize) -> Self {
        Self {
            program: program.into(),
            timeout,
            output_limit_bytes,
        }
    }

    pub fn from_config(cfg: &BuildConfig) -> Self {
        Self::new(
            &cfg.shell,
            cfg.command_timeout_secs.map(Duration::from_secs),
            cfg.command_output_limit_bytes,
        )
    }
}

impl Shell for SystemShell {
    #[instrument(skip_all, fields(workdir = %workdir.display()))]
    fn run(&self, command: &str, workdir: &Path) -> Result<ExecutionResult> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c").arg(command).current_dir(workdir);

        let output = run_captured(cmd, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run `{command}` with {}", self.program.display()))?;

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        stdout.push_str(&output.stdout_truncated_notice());
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        stderr.push_str(&output.stderr_truncated_notice());
        if output.timed_out
            && let Some(limit) = self.timeout
        {
            stderr.push_str(&format!("\n[command timed out after {}s]", limit.as_secs()));
        }

        let exit_code = output.status.code().unwrap_or(-1);
        debug!(exit_code, "shell command finished");
        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
        })
    }
}
