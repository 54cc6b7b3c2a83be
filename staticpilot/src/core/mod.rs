//! Deterministic, pure logic shared by the build pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod conversation;
pub mod endpoint;
pub mod rewrite;
pub mod sanitize;
pub mod summary;
pub mod types;
