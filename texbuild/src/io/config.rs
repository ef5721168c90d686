//! Build configuration, optionally read from `texbuild.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::document::DEFAULT_BASENAME;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "texbuild.toml";

/// Build configuration (TOML).
///
/// Constructed once at startup (file, then CLI overrides) and passed by
/// reference to every operation. Missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding the `.tex` source and every compiler artifact.
    pub output_dir: PathBuf,

    /// File stem shared by `<basename>.tex` and `<basename>.pdf`.
    pub basename: String,

    /// Try the primary compiler before falling back.
    pub prefer_latexmk: bool,

    /// Sequential passes of the secondary compiler (TOC and references need two).
    pub pdflatex_passes: u32,

    pub primary_program: String,

    pub secondary_program: String,

    /// Accept a primary run that exited non-zero if the PDF's mtime advanced.
    pub trust_timestamp: bool,

    /// Kill a compiler that runs longer than this. `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Write raw compiler output to `<basename>.texbuild.log`.
    pub write_log: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            basename: DEFAULT_BASENAME.to_string(),
            prefer_latexmk: true,
            pdflatex_passes: 2,
            primary_program: "latexmk".to_string(),
            secondary_program: "pdflatex".to_string(),
            trust_timestamp: true,
            timeout_secs: None,
            write_log: true,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<()> {
        if self.basename.trim().is_empty() {
            return Err(anyhow!("basename must not be empty"));
        }
        if self.basename.contains(['/', '\\']) || self.basename == "." || self.basename == ".." {
            return Err(anyhow!(
                "basename must be a file stem, not a path: {}",
                self.basename
            ));
        }
        if self.pdflatex_passes == 0 {
            return Err(anyhow!("pdflatex_passes must be > 0"));
        }
        if self.primary_program.trim().is_empty() {
            return Err(anyhow!("primary_program must not be empty"));
        }
        if self.secondary_program.trim().is_empty() {
            return Err(anyhow!("secondary_program must not be empty"));
        }
        if self.timeout_secs == Some(0) {
            return Err(anyhow!("timeout_secs must be > 0 when set"));
        }
        Ok(())
    }

    /// Source file name as passed to the compilers (relative to `output_dir`).
    pub fn tex_file_name(&self) -> String {
        format!("{}.tex", self.basename)
    }

    pub fn tex_path(&self) -> PathBuf {
        self.output_dir.join(self.tex_file_name())
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.pdf", self.basename))
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.texbuild.log", self.basename))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Apply CLI overrides on top of file/default values, then re-validate.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(dir) = &overrides.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(basename) = &overrides.basename {
            self.basename = basename.clone();
        }
        if let Some(passes) = overrides.pdflatex_passes {
            self.pdflatex_passes = passes;
        }
        if overrides.no_latexmk {
            self.prefer_latexmk = false;
        }
        if overrides.strict {
            self.trust_timestamp = false;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = Some(secs);
        }
        if overrides.no_log {
            self.write_log = false;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Command-line values that take precedence over the config file.
///
/// Flags only ever switch behavior away from the defaults; they cannot
/// re-enable something the file disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub basename: Option<String>,
    pub pdflatex_passes: Option<u32>,
    pub no_latexmk: bool,
    pub strict: bool,
    pub timeout_secs: Option<u64>,
    pub no_log: bool,
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BuildConfig::default()`.
pub fn load_config(path: &Path) -> Result<BuildConfig> {
    if !path.exists() {
        let cfg = BuildConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BuildConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
