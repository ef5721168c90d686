//! Console formatting helpers.

use std::ffi::OsStr;

/// Size in KiB with one decimal place, e.g. `2048` -> `"2.0"`.
pub fn format_kib(size_bytes: u64) -> String {
    format!("{:.1}", size_bytes as f64 / 1024.0)
}

/// How a process ended, e.g. `"exited with status 1"`.
pub fn describe_exit(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// Space-joined command line for `[RUN]` lines and log headers.
pub fn render_command_line<S: AsRef<OsStr>>(program: &OsStr, args: &[S]) -> String {
    let mut line = program.to_string_lossy().into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}
