//! Typed failures for the fatal outcomes of a build run.
//!
//! Everything flows through `anyhow::Result`; these types exist so callers can
//! `downcast_ref` to tell the failure classes apart (exit codes, tests).
//! A command that exits non-zero is never an error here: it is fed back to the
//! oracle as an observation.

use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration was missing or rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config {}: {message}", path.display())]
    File { path: PathBuf, message: String },
}

/// The oracle broke the request/reply protocol.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("received empty command from oracle")]
    EmptyReply,

    #[error("oracle request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected oracle response: {body}")]
    MissingContent { body: String },
}

/// The step budget ran out before the oracle signalled completion.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("reached max_steps={max_steps} without completion")]
pub struct StepBudgetExhausted {
    pub max_steps: u32,
}

/// No directory under `root` looked like a static build output.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unable to locate build output directory under {}", root.display())]
pub struct NoArtifactFound {
    pub root: PathBuf,
}
