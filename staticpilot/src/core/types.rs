//! Shared value types passed between the ports and the core.

use serde::{Deserialize, Serialize};

/// Outcome of one shell command run by the execution port.
///
/// Produced once per executed command and consumed by the output summarizer.
/// A non-zero `exit_code` is ordinary information, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Process exit code, or `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
