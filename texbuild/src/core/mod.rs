//! Deterministic, pure logic shared by the build orchestrator.
//!
//! Core modules must be free of I/O side effects. They operate on values
//! gathered by `io` and return deterministic outputs suitable for tests.

pub mod format;
pub mod types;
pub mod verdict;
