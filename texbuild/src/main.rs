//! Typesets the embedded sonoluminescence manuscript.
//!
//! Writes `<output_dir>/<basename>.tex` and compiles it with `latexmk`,
//! falling back to repeated `pdflatex` passes. Exit code 0 means the PDF is on
//! disk; anything else is reported with a diagnostic and exit code 1.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use texbuild::build::{locate_tools, run_build, write_document};
use texbuild::exit_codes;
use texbuild::io::compiler::ProcessRunner;
use texbuild::io::config::{BuildConfig, ConfigOverrides, DEFAULT_CONFIG_FILE, load_config};
use texbuild::io::locator::PathLocator;
use texbuild::logging;

#[derive(Parser)]
#[command(
    name = "texbuild",
    version,
    about = "Write the embedded LaTeX manuscript and compile it to PDF"
)]
struct Cli {
    /// Log debug diagnostics to stderr (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Defaults to `build` with no flags.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the `.tex` source and compile it (latexmk, then pdflatex passes).
    Build(BuildArgs),
    /// Only write the `.tex` source.
    Write(TargetArgs),
    /// Report whether the configured compilers are on PATH.
    Tools(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

impl Default for ConfigArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }
}

#[derive(Args, Default)]
struct TargetArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Directory for the source and every compiler artifact.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File stem for `<basename>.tex` / `<basename>.pdf`.
    #[arg(long)]
    basename: Option<String>,
}

#[derive(Args, Default)]
struct BuildArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Number of pdflatex passes when falling back.
    #[arg(long)]
    passes: Option<u32>,

    /// Skip latexmk even if installed.
    #[arg(long)]
    no_latexmk: bool,

    /// Trust only exit codes; a newer PDF does not rescue a failed latexmk run.
    #[arg(long)]
    strict: bool,

    /// Kill a compiler that runs longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Do not write the raw `<basename>.texbuild.log`.
    #[arg(long)]
    no_log: bool,
}

impl TargetArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            output_dir: self.output_dir.clone(),
            basename: self.basename.clone(),
            ..ConfigOverrides::default()
        }
    }
}

impl BuildArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            pdflatex_passes: self.passes,
            no_latexmk: self.no_latexmk,
            strict: self.strict,
            timeout_secs: self.timeout,
            no_log: self.no_log,
            ..self.target.overrides()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("[ERR] {:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command.unwrap_or_else(|| Command::Build(BuildArgs::default())) {
        Command::Build(args) => cmd_build(&args),
        Command::Write(args) => cmd_write(&args),
        Command::Tools(args) => cmd_tools(&args),
    }
}

fn resolve_config(args: &ConfigArgs, overrides: &ConfigOverrides) -> Result<BuildConfig> {
    load_config(&args.config)?.with_overrides(overrides)
}

fn cmd_build(args: &BuildArgs) -> Result<i32> {
    let config = resolve_config(&args.target.config, &args.overrides())?;
    let mut stdout = io::stdout().lock();
    let report = run_build(&config, &PathLocator::from_env(), &ProcessRunner, &mut stdout);
    stdout.flush()?;
    let report = report?;
    Ok(if report.outcome.is_success() {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}

fn cmd_write(args: &TargetArgs) -> Result<i32> {
    let config = resolve_config(&args.config, &args.overrides())?;
    write_document(&config, &mut io::stdout().lock())?;
    Ok(exit_codes::OK)
}

fn cmd_tools(args: &ConfigArgs) -> Result<i32> {
    let config = resolve_config(args, &ConfigOverrides::default())?;
    let statuses = locate_tools(&config, &PathLocator::from_env());
    for status in &statuses {
        let role = status.compiler.role();
        match &status.path {
            Some(path) => println!("{} ({role}): {}", status.program, path.display()),
            None => println!("{} ({role}): not found", status.program),
        }
    }
    let usable = statuses.iter().any(|status| status.path.is_some());
    Ok(if usable {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}
