//! Success detection for compiler invocations.

use std::time::SystemTime;

/// How the primary compiler's invocation was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryVerdict {
    /// The process exited with status zero.
    Exited,
    /// Non-zero exit, but the artifact's mtime moved forward.
    ///
    /// Some toolchains return non-zero on benign warnings yet still write a
    /// usable PDF. A tool that touches the file before failing, or clock
    /// skew, lands here too, so callers surface this case loudly.
    TimestampAdvanced,
    Failed,
}

impl PrimaryVerdict {
    pub fn passed(self) -> bool {
        !matches!(self, PrimaryVerdict::Failed)
    }
}

/// Judge the primary compiler: exit status zero OR artifact mtime strictly advanced.
///
/// `before`/`after` are `UNIX_EPOCH` when the artifact did not exist. With
/// `trust_timestamp` off only the exit status counts.
pub fn judge_primary(
    exit_success: bool,
    before: SystemTime,
    after: SystemTime,
    trust_timestamp: bool,
) -> PrimaryVerdict {
    if exit_success {
        PrimaryVerdict::Exited
    } else if trust_timestamp && after > before {
        PrimaryVerdict::TimestampAdvanced
    } else {
        PrimaryVerdict::Failed
    }
}
