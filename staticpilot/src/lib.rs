//! Oracle-driven static builds for front-end project archives.
//!
//! A remote reasoning service (the oracle) proposes one shell command at a
//! time; the runner executes it, feeds the bounded output back, and repeats
//! until the oracle signals completion or the step budget runs out. The
//! produced static site is then located, published to a release directory,
//! and paired with web-server rewrite rules.
//!
//! - **[`core`]**: Pure, deterministic logic (reply sanitizing, observation
//!   summaries, rewrite-rule validation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (oracle HTTP, shell execution,
//!   filesystem search and moves). Ports are traits so tests can script them.
//!
//! Orchestration modules ([`build_loop`], [`pipeline`]) coordinate core logic
//! with I/O to implement CLI commands.

pub mod build_loop;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
