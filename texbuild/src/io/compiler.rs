//! Compiler invocation abstraction.
//!
//! The [`CommandRunner`] trait decouples build orchestration from actually
//! spawning `latexmk`/`pdflatex`. Tests use scripted runners that return
//! predetermined exit codes (and touch the PDF) without spawning processes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use crate::core::format::render_command_line;
use crate::io::process::{apply_utf8_env, run_command};

/// One compiler run: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Resolved executable path.
    pub program: PathBuf,
    pub args: Vec<String>,
    /// The output directory; the target is passed as a bare file name.
    pub workdir: PathBuf,
    /// `None` waits for the compiler indefinitely.
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        render_command_line(self.program.as_os_str(), &self.args)
    }
}

/// Result of a compiler run that started.
///
/// `output` is the raw interleaved stdout/stderr; decode only for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutput {
    pub success: bool,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub output: Vec<u8>,
    /// The compiler was killed at the configured deadline.
    pub timed_out: bool,
}

impl InvocationOutput {
    /// Captured output, lossily decoded for the console.
    pub fn display_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Abstraction over running an external compiler.
pub trait CommandRunner {
    /// Run to completion or to the deadline. `Err` means the process could
    /// not be executed (spawn/wait failure); a non-zero exit or a timeout is
    /// reported in the output so what the compiler printed is never lost.
    fn run(&self, invocation: &Invocation) -> Result<InvocationOutput>;
}

/// Runner that spawns real processes with a UTF-8 locale.
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    #[instrument(skip_all, fields(program = %invocation.program.display()))]
    fn run(&self, invocation: &Invocation) -> Result<InvocationOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.workdir);
        apply_utf8_env(&mut cmd);

        let output = run_command(cmd, invocation.timeout)
            .with_context(|| format!("run {}", invocation.command_line()))?;

        if output.timed_out {
            warn!("compiler timed out");
        } else {
            debug!(exit_code = ?output.status.code(), "compiler finished");
        }
        Ok(InvocationOutput {
            success: output.status.success() && !output.timed_out,
            exit_code: output.status.code(),
            output: output.output,
            timed_out: output.timed_out,
        })
    }
}
