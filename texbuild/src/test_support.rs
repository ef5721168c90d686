//! Test-only fakes for tool discovery and compiler execution.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::io::compiler::{CommandRunner, Invocation, InvocationOutput};
use crate::io::config::BuildConfig;
use crate::io::locator::ToolLocator;

/// Locator that knows exactly the programs it was given.
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    tools: HashMap<String, PathBuf>,
}

impl StaticLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `program` as installed at `/fake/bin/<program>`.
    pub fn with(mut self, program: &str) -> Self {
        self.tools
            .insert(program.to_string(), Path::new("/fake/bin").join(program));
        self
    }
}

impl ToolLocator for StaticLocator {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.tools.get(program).cloned()
    }
}

/// Predetermined behavior for one compiler invocation.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    exit_code: i32,
    touch_pdf: bool,
    output: Vec<u8>,
    spawn_failure: bool,
    timed_out: bool,
}

impl ScriptedRun {
    pub fn exit(exit_code: i32) -> Self {
        Self {
            exit_code,
            touch_pdf: false,
            output: Vec::new(),
            spawn_failure: false,
            timed_out: false,
        }
    }

    /// Write `<basename>.pdf` in the working directory with a fresh mtime.
    pub fn touching_pdf(mut self) -> Self {
        self.touch_pdf = true;
        self
    }

    pub fn with_output(mut self, output: &[u8]) -> Self {
        self.output = output.to_vec();
        self
    }

    /// Behave as if the compiler was killed for exceeding its timeout.
    pub fn timing_out() -> Self {
        Self {
            timed_out: true,
            ..Self::exit(0)
        }
    }

    /// Behave as if the executable could not be started.
    pub fn spawn_failure() -> Self {
        Self {
            spawn_failure: true,
            ..Self::exit(0)
        }
    }
}

/// Runner that replays [`ScriptedRun`]s in order and records every invocation.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    script: RefCell<VecDeque<ScriptedRun>>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new(script: Vec<ScriptedRun>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// File names of the invoked programs, in call order.
    pub fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| call.program.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<InvocationOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let step = self
            .script
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected invocation {}", invocation.command_line()))?;

        if step.spawn_failure {
            return Err(anyhow!("spawn {}: not executable", invocation.command_line()));
        }
        if step.touch_pdf {
            let target = invocation
                .args
                .last()
                .ok_or_else(|| anyhow!("invocation has no target"))?;
            let pdf = invocation
                .workdir
                .join(Path::new(target).with_extension("pdf"));
            write_with_mtime(&pdf, b"%PDF-1.5 scripted", SystemTime::now())?;
        }
        if step.timed_out {
            return Ok(InvocationOutput {
                success: false,
                exit_code: None,
                output: step.output,
                timed_out: true,
            });
        }
        Ok(InvocationOutput {
            success: step.exit_code == 0,
            exit_code: Some(step.exit_code),
            output: step.output,
            timed_out: false,
        })
    }
}

/// Write `contents` to `path` and pin its modification time.
pub fn write_with_mtime(path: &Path, contents: &[u8], mtime: SystemTime) -> Result<()> {
    fs::write(path, contents)?;
    File::options().write(true).open(path)?.set_modified(mtime)?;
    Ok(())
}

/// Temporary output directory with a config pointing into it.
pub struct TestWorkspace {
    temp: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: tempfile::tempdir()?,
        })
    }

    /// Default config with `output_dir` set to a not-yet-existing subdirectory.
    pub fn config(&self) -> BuildConfig {
        BuildConfig {
            output_dir: self.temp.path().join("output"),
            basename: "doc".to_string(),
            ..BuildConfig::default()
        }
    }

    /// Seed a stale PDF, an hour old, at the configured artifact path.
    pub fn seed_stale_pdf(&self, config: &BuildConfig) -> Result<()> {
        fs::create_dir_all(&config.output_dir)?;
        let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
        write_with_mtime(&config.pdf_path(), b"%PDF-1.5 stale", an_hour_ago)
    }
}

/// Create an executable `sh` script named `name` in `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    let mut perms = fs::metadata(&path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms)?;
    Ok(path)
}
