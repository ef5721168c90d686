//! Helpers for running child processes and capturing their raw output.

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Locale variables that must name a UTF-8 locale for TeX tools to read the source correctly.
const LOCALE_VARS: [&str; 2] = ["LC_ALL", "LANG"];
const FALLBACK_LOCALE: &str = "C.UTF-8";

/// Captured child process output.
///
/// stdout and stderr share one pipe, so `output` holds both streams
/// interleaved in the order the child wrote them, byte for byte.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub output: Vec<u8>,
    pub timed_out: bool,
}

/// Run a command with stdout and stderr merged into one captured pipe.
///
/// Output is drained concurrently while the child runs. With `timeout` set, a
/// child still running at the deadline is killed and `timed_out` is reported
/// along with whatever it printed; without it the call blocks until the child
/// exits.
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs())))]
pub fn run_command(mut cmd: Command, timeout: Option<Duration>) -> Result<CommandOutput> {
    let (reader, writer) = io::pipe().context("create output pipe")?;
    let stdout_writer = writer.try_clone().context("clone output pipe")?;
    cmd.stdin(Stdio::null())
        .stdout(stdout_writer)
        .stderr(writer);

    debug!("spawning child process");
    let spawned = cmd.spawn();
    // The command still owns the parent's write ends; drop them so the reader sees EOF.
    drop(cmd);
    let mut child = match spawned {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let output_handle = thread::spawn(move || read_stream(reader));

    let mut timed_out = false;
    let status = match timeout {
        None => child.wait().context("wait for command")?,
        Some(limit) => match child.wait_timeout(limit).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(timeout_secs = limit.as_secs(), "command timed out, killing");
                timed_out = true;
                child.kill().context("kill command")?;
                child.wait().context("wait command after kill")?
            }
        },
    };

    let output = join_output(output_handle).context("join output")?;

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        output,
        timed_out,
    })
}

fn join_output(handle: thread::JoinHandle<Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).context("read output")?;
    Ok(buf)
}

/// Locale overrides that steer a child toward UTF-8.
///
/// A variable is replaced with `C.UTF-8` when it is unset, empty, or names a
/// non-UTF-8 locale. `lookup` is injected so the policy can be tested without
/// touching the process environment.
pub fn utf8_locale_overrides<F>(lookup: F) -> Vec<(&'static str, &'static str)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overrides = Vec::new();
    for key in LOCALE_VARS {
        let favours_utf8 = lookup(key).is_some_and(|value| is_utf8_locale(&value));
        if !favours_utf8 {
            overrides.push((key, FALLBACK_LOCALE));
        }
    }
    overrides
}

/// Apply [`utf8_locale_overrides`] for the current process environment to `cmd`.
pub fn apply_utf8_env(cmd: &mut Command) {
    for (key, value) in utf8_locale_overrides(|key| std::env::var(key).ok()) {
        cmd.env(key, value);
    }
}

fn is_utf8_locale(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.contains("utf-8") || lower.contains("utf8")
}
