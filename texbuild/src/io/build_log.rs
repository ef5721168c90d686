//! Raw build log at `<output_dir>/<basename>.texbuild.log`.
//!
//! The log is the byte-exact record of what each compiler printed. It is
//! never decoded, so invalid UTF-8 from TeX survives intact.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::format::describe_exit;
use crate::io::compiler::{Invocation, InvocationOutput};

/// Append-only writer for one build's invocations.
///
/// Created fresh per build, so a log only ever describes the latest run.
pub struct BuildLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl BuildLog {
    /// Truncate or create the log at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create build log dir {}", parent.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("create build log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    /// Record one invocation: command line and how it ended, then its output verbatim.
    pub fn record(&mut self, invocation: &Invocation, output: &InvocationOutput) -> Result<()> {
        let ending = if output.timed_out {
            "timed out".to_string()
        } else {
            describe_exit(output.exit_code)
        };
        let header = format!("=== {} ({ending}) ===\n", invocation.command_line());
        self.write_all(header.as_bytes())?;
        self.write_all(&output.output)?;
        self.write_all(b"\n")?;
        self.writer
            .flush()
            .with_context(|| format!("flush build log {}", self.path.display()))
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .with_context(|| format!("write build log {}", self.path.display()))
    }
}
