//! Test-only fakes for the oracle and execution ports, plus project fixtures.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::core::conversation::Message;
use crate::core::types::ExecutionResult;
use crate::io::oracle::Oracle;
use crate::io::shell::Shell;

/// Oracle that replays canned replies and records every conversation it saw.
pub struct ScriptedOracle {
    replies: RefCell<VecDeque<String>>,
    repeat: Option<String>,
    calls: RefCell<Vec<Vec<Message>>>,
}

impl ScriptedOracle {
    /// Reply with `replies` in order, then fail.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: RefCell::new(replies.into_iter().map(Into::into).collect()),
            repeat: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Reply with `reply` forever.
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self {
            replies: RefCell::new(VecDeque::new()),
            repeat: Some(reply.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Oracle for ScriptedOracle {
    fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.borrow_mut().push(messages.to_vec());
        if let Some(reply) = self.replies.borrow_mut().pop_front() {
            return Ok(reply);
        }
        self.repeat
            .clone()
            .ok_or_else(|| anyhow!("scripted oracle has no replies left"))
    }
}

/// Canned response of a [`ScriptedShell`], with files to create on execution.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub result: ExecutionResult,
    /// Files written relative to the working directory before returning.
    pub files: Vec<(PathBuf, String)>,
}

impl ScriptedRun {
    pub fn ok(stdout: &str) -> Self {
        Self::result(ExecutionResult {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    pub fn failed(exit_code: i32, stderr: &str) -> Self {
        Self::result(ExecutionResult {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }

    pub fn result(result: ExecutionResult) -> Self {
        Self {
            result,
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.files.push((path.into(), contents.to_string()));
        self
    }
}

/// One recorded shell invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCall {
    pub command: String,
    pub workdir: PathBuf,
}

/// Shell that returns scripted results in order and records every call.
pub struct ScriptedShell {
    runs: RefCell<VecDeque<ScriptedRun>>,
    calls: RefCell<Vec<ShellCall>>,
}

impl ScriptedShell {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            runs: RefCell::new(runs.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ShellCall> {
        self.calls.borrow().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.command.clone()).collect()
    }
}

impl Shell for ScriptedShell {
    fn run(&self, command: &str, workdir: &Path) -> Result<ExecutionResult> {
        self.calls.borrow_mut().push(ShellCall {
            command: command.to_string(),
            workdir: workdir.to_path_buf(),
        });
        let run = self
            .runs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted shell has no runs left for `{command}`"))?;
        for (relative, contents) in &run.files {
            let path = workdir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, contents)?;
        }
        Ok(run.result)
    }
}

/// Temporary project directory with small fixture helpers.
pub struct TestProject {
    temp: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            temp: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.temp.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write fixture file");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.temp.path().join(relative)).expect("read fixture file")
    }

    /// Set the modification time of a file or directory.
    pub fn set_mtime(&self, relative: &str, time: SystemTime) {
        fs::File::open(self.temp.path().join(relative))
            .and_then(|file| file.set_modified(time))
            .expect("set mtime");
    }
}
