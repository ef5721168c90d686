//! I/O helpers for texbuild commands.

pub mod build_log;
pub mod compiler;
pub mod config;
pub mod locator;
pub mod process;
pub mod workspace;
