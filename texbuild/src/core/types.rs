//! Shared deterministic types for build outcomes.
//!
//! These types are the contract between the orchestrator and its callers.
//! Expected failures are values, not errors, so `main` can map them onto
//! exit codes and tests can assert them directly.

use std::fmt;
use std::path::PathBuf;

use crate::core::format::describe_exit;

/// Which compiler a stage invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compiler {
    /// `latexmk` by default; one invocation, judged with the timestamp heuristic.
    Primary,
    /// `pdflatex` by default; a fixed number of passes, exit status trusted.
    Secondary,
}

impl Compiler {
    pub fn role(self) -> &'static str {
        match self {
            Compiler::Primary => "primary",
            Compiler::Secondary => "fallback",
        }
    }
}

/// One attempted invocation of an external compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub compiler: Compiler,
    /// Program name as resolved by the locator.
    pub program: String,
    /// 1-based pass number. Always 1 for the primary compiler.
    pub pass: u32,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub passed: bool,
}

/// Why a build did not produce its artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The fallback compiler is not on the search path.
    SecondaryMissing { program: String },
    /// A fallback pass exited non-zero; later passes were not run.
    PassFailed { pass: u32, exit_code: Option<i32> },
    /// Compilation reported success but the PDF is not on disk.
    ArtifactMissing { pdf_path: PathBuf },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::SecondaryMissing { program } => {
                write!(f, "{program} not found on PATH")
            }
            FailureReason::PassFailed { pass, exit_code } => {
                write!(f, "pass {pass} {}", describe_exit(*exit_code))
            }
            FailureReason::ArtifactMissing { pdf_path } => {
                write!(f, "expected artifact {} is missing", pdf_path.display())
            }
        }
    }
}

/// Final classification of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Produced { pdf_path: PathBuf, size_bytes: u64 },
    Failed(FailureReason),
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Produced { .. })
    }
}

/// Everything a build attempted, in order, plus its final outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub outcome: BuildOutcome,
    pub stages: Vec<StageRecord>,
}

impl BuildReport {
    pub fn invocations_of(&self, compiler: Compiler) -> usize {
        self.stages
            .iter()
            .filter(|stage| stage.compiler == compiler)
            .count()
    }
}
