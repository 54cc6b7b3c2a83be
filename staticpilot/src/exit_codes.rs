//! Stable exit codes for the staticpilot CLI.

use crate::error::ConfigError;

/// The release bundle was produced.
pub const OK: i32 = 0;
/// The run failed after startup (oracle, budget, discovery, publish, I/O).
pub const FAILED: i32 = 1;
/// Startup configuration was missing or invalid; nothing was touched.
pub const CONFIG: i32 = 2;

/// Map a fatal error to its exit code.
pub fn for_error(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        CONFIG
    } else {
        FAILED
    }
}
