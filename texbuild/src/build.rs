//! Orchestration for `texbuild build`.
//!
//! Writes the manuscript, tries the primary compiler, falls back to a fixed
//! number of secondary passes, then checks the artifact. Console lines go to
//! the caller-supplied writer; expected failures come back as
//! [`BuildOutcome::Failed`] and only execution errors are `Err`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{debug, info, instrument, warn};

use crate::core::format::{describe_exit, format_kib};
use crate::core::types::{BuildOutcome, BuildReport, Compiler, FailureReason, StageRecord};
use crate::core::verdict::{PrimaryVerdict, judge_primary};
use crate::document::MANUSCRIPT;
use crate::io::build_log::BuildLog;
use crate::io::compiler::{CommandRunner, Invocation, InvocationOutput};
use crate::io::config::BuildConfig;
use crate::io::locator::ToolLocator;
use crate::io::workspace::{artifact_size, ensure_output_dir, modified_or_epoch, write_source};

const NONSTOP: &str = "-interaction=nonstopmode";

/// Create the output directory and write the manuscript source.
pub fn write_document<W: Write>(config: &BuildConfig, out: &mut W) -> Result<PathBuf> {
    ensure_output_dir(&config.output_dir)?;
    let tex_path = config.tex_path();
    write_source(&tex_path, MANUSCRIPT)?;
    writeln!(out, "[OK] wrote {}", tex_path.display())?;
    Ok(tex_path)
}

/// Run a full build: write source, compile, verify the artifact.
#[instrument(skip_all, fields(output_dir = %config.output_dir.display(), basename = %config.basename))]
pub fn run_build<L, R, W>(
    config: &BuildConfig,
    locator: &L,
    runner: &R,
    out: &mut W,
) -> Result<BuildReport>
where
    L: ToolLocator,
    R: CommandRunner,
    W: Write,
{
    write_document(config, out)?;

    let mut session = Session {
        config,
        runner,
        out,
        log: if config.write_log {
            Some(BuildLog::create(&config.log_path())?)
        } else {
            None
        },
        stages: Vec::new(),
    };

    let mut compiled = false;
    if config.prefer_latexmk {
        compiled = session.try_primary(locator)?;
    }

    let failure = if compiled {
        None
    } else {
        session.run_secondary(locator)?
    };

    let outcome = match failure {
        Some(reason) => BuildOutcome::Failed(reason),
        None => check_artifact(&config.pdf_path()),
    };

    match &outcome {
        BuildOutcome::Produced {
            pdf_path,
            size_bytes,
        } => {
            info!(size_bytes, "pdf produced");
            writeln!(
                session.out,
                "[OK] PDF written: {} ({} KB)",
                pdf_path.display(),
                format_kib(*size_bytes)
            )?;
        }
        BuildOutcome::Failed(reason) => {
            warn!(%reason, "build failed");
            writeln!(session.out, "[ERR] compilation failed: {reason}")?;
        }
    }

    Ok(BuildReport {
        outcome,
        stages: session.stages,
    })
}

fn check_artifact(pdf_path: &Path) -> BuildOutcome {
    match artifact_size(pdf_path) {
        Some(size_bytes) => BuildOutcome::Produced {
            pdf_path: pdf_path.to_path_buf(),
            size_bytes,
        },
        None => BuildOutcome::Failed(FailureReason::ArtifactMissing {
            pdf_path: pdf_path.to_path_buf(),
        }),
    }
}

/// Per-build mutable state: console, raw log and the stage ledger.
struct Session<'a, R, W> {
    config: &'a BuildConfig,
    runner: &'a R,
    out: &'a mut W,
    log: Option<BuildLog>,
    stages: Vec<StageRecord>,
}

impl<R: CommandRunner, W: Write> Session<'_, R, W> {
    /// Returns whether the primary compiler produced a usable build.
    fn try_primary<L: ToolLocator>(&mut self, locator: &L) -> Result<bool> {
        let name = self.config.primary_program.clone();
        let Some(program) = locator.locate(&name) else {
            debug!(program = %name, "primary compiler not installed");
            writeln!(
                self.out,
                "[INFO] {name} not found on PATH, falling back to {}",
                self.config.secondary_program
            )?;
            return Ok(false);
        };

        let pdf_path = self.config.pdf_path();
        let before = modified_or_epoch(&pdf_path)?;
        let output = self.invoke(program, vec!["-pdf".to_string(), NONSTOP.to_string()])?;
        let after = modified_or_epoch(&pdf_path)?;

        let verdict = judge_primary(output.success, before, after, self.config.trust_timestamp);
        self.stages.push(StageRecord {
            compiler: Compiler::Primary,
            program: name.clone(),
            pass: 1,
            exit_code: output.exit_code,
            passed: verdict.passed(),
        });

        match verdict {
            PrimaryVerdict::Exited => {}
            PrimaryVerdict::TimestampAdvanced => {
                warn!(
                    exit_code = ?output.exit_code,
                    "accepting non-zero exit because the PDF timestamp advanced"
                );
                writeln!(
                    self.out,
                    "[WARN] {name} {} but updated {}; treating as success",
                    describe_exit(output.exit_code),
                    pdf_path.display()
                )?;
            }
            PrimaryVerdict::Failed => {
                writeln!(
                    self.out,
                    "[WARN] {name} failed, falling back to {}...",
                    self.config.secondary_program
                )?;
            }
        }
        Ok(verdict.passed())
    }

    /// Runs the fallback passes. Returns the failure, if any.
    fn run_secondary<L: ToolLocator>(&mut self, locator: &L) -> Result<Option<FailureReason>> {
        let name = self.config.secondary_program.clone();
        let Some(program) = locator.locate(&name) else {
            writeln!(self.out, "[ERR] {name} not found on PATH")?;
            return Ok(Some(FailureReason::SecondaryMissing { program: name }));
        };

        let passes = self.config.pdflatex_passes;
        for pass in 1..=passes {
            writeln!(self.out, "[INFO] {name} pass {pass}/{passes}")?;
            let output = self.invoke(program.clone(), vec![NONSTOP.to_string()])?;
            self.stages.push(StageRecord {
                compiler: Compiler::Secondary,
                program: name.clone(),
                pass,
                exit_code: output.exit_code,
                passed: output.success,
            });
            if !output.success {
                debug!(pass, "secondary pass failed, skipping remaining passes");
                return Ok(Some(FailureReason::PassFailed {
                    pass,
                    exit_code: output.exit_code,
                }));
            }
        }
        Ok(None)
    }

    /// Run `program` on the source file inside the output directory and echo its output.
    /// A compiler killed by the timeout is an error, after its output has been shown.
    fn invoke(&mut self, program: PathBuf, mut args: Vec<String>) -> Result<InvocationOutput> {
        args.push(self.config.tex_file_name());
        let invocation = Invocation {
            program,
            args,
            workdir: self.config.output_dir.clone(),
            timeout: self.config.timeout(),
        };

        writeln!(self.out, "[RUN] {}", invocation.command_line())?;
        let output = self.runner.run(&invocation)?;
        if let Some(log) = self.log.as_mut() {
            log.record(&invocation, &output)?;
        }

        if !output.success {
            writeln!(self.out, "=== Build failed ===")?;
        }
        writeln!(self.out, "{}", output.display_text())?;
        if output.timed_out {
            bail!(
                "{} timed out after {}s",
                invocation.command_line(),
                invocation.timeout.unwrap_or_default().as_secs()
            );
        }
        Ok(output)
    }
}

/// Whether a configured compiler is installed, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub compiler: Compiler,
    pub program: String,
    pub path: Option<PathBuf>,
}

/// Look up both compilers without running anything.
pub fn locate_tools<L: ToolLocator>(config: &BuildConfig, locator: &L) -> Vec<ToolStatus> {
    [
        (Compiler::Primary, &config.primary_program),
        (Compiler::Secondary, &config.secondary_program),
    ]
    .into_iter()
    .map(|(compiler, program)| ToolStatus {
        compiler,
        program: program.clone(),
        path: locator.locate(program),
    })
    .collect()
}
