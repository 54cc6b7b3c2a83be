//! I/O adapters for the build pipeline.

pub mod archive;
pub mod config;
pub mod locator;
pub mod oracle;
pub mod process;
pub mod prompt;
pub mod publish;
pub mod release;
pub mod shell;
pub mod survey;
