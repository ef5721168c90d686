//! Stable exit codes for texbuild CLI commands.

/// The PDF was produced and is present at the expected path.
pub const OK: i32 = 0;
/// Compilation failed, the artifact is missing, or an unexpected error occurred.
pub const FAILED: i32 = 1;
