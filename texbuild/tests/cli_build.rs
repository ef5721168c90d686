//! CLI tests for `texbuild build`, `write` and `tools`.
//!
//! Spawns the texbuild binary with a private `PATH` holding fake `latexmk` /
//! `pdflatex` shell scripts, then checks exit codes and files on disk.
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use texbuild::core::format::format_kib;
use texbuild::document::MANUSCRIPT;
use texbuild::exit_codes;
use texbuild::test_support::write_script;

/// Fake compiler that appends its arguments to `calls.log` and writes `<stem>.pdf`.
const WRITES_PDF: &str = r#"echo "$0 $*" >> calls.log
for last; do :; done
printf '%%PDF-1.5 fake output' > "${last%.tex}.pdf"
exit 0"#;

fn texbuild(root: &Path, bin: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_texbuild"))
        .current_dir(root)
        .env("PATH", bin)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run texbuild")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn call_count(out_dir: &Path) -> usize {
    fs::read_to_string(out_dir.join("calls.log"))
        .map(|calls| calls.lines().count())
        .unwrap_or(0)
}

#[test]
fn primary_success_creates_dir_and_reports_size() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");
    write_script(&bin, "latexmk", WRITES_PDF).expect("latexmk");

    let output = texbuild(temp.path(), &bin, &["build", "--output-dir", "out/nested"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{}", stdout(&output));
    let out_dir = temp.path().join("out/nested");
    let pdf = out_dir.join("sonoluminescence.pdf");
    let size = fs::metadata(&pdf).expect("pdf").len();
    assert!(stdout(&output).contains(&format!("({} KB)", format_kib(size))));
    assert_eq!(
        fs::read_to_string(out_dir.join("sonoluminescence.tex")).expect("tex"),
        MANUSCRIPT
    );
    let calls = fs::read_to_string(out_dir.join("calls.log")).expect("calls");
    assert!(calls.contains("-pdf -interaction=nonstopmode sonoluminescence.tex"));
}

#[test]
fn primary_nonzero_exit_with_fresh_pdf_succeeds() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");
    write_script(
        &bin,
        "latexmk",
        "printf '%%PDF-1.5' > doc.pdf\necho 'Warning: rerun' >&2\nexit 12",
    )
    .expect("latexmk");
    write_script(&bin, "pdflatex", "exit 99").expect("pdflatex");

    let output = texbuild(
        temp.path(),
        &bin,
        &["build", "--output-dir", "out", "--basename", "doc"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{}", stdout(&output));
    assert!(stdout(&output).contains("treating as success"));
}

#[test]
fn strict_build_ignores_fresh_pdf_from_failed_primary() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");
    write_script(&bin, "latexmk", "printf '%%PDF-1.5' > doc.pdf\nexit 12").expect("latexmk");
    write_script(&bin, "pdflatex", "exit 1").expect("pdflatex");

    let output = texbuild(
        temp.path(),
        &bin,
        &["build", "--output-dir", "out", "--basename", "doc", "--strict"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(stdout(&output).contains("[ERR] compilation failed: pass 1 exited with status 1"));
}

#[test]
fn fallback_runs_two_passes_when_latexmk_missing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");
    write_script(&bin, "pdflatex", WRITES_PDF).expect("pdflatex");

    let output = texbuild(temp.path(), &bin, &["build", "--output-dir", "out"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{}", stdout(&output));
    let out_dir = temp.path().join("out");
    assert_eq!(call_count(&out_dir), 2);
    assert!(out_dir.join("sonoluminescence.pdf").is_file());
    assert!(stdout(&output).contains("[INFO] pdflatex pass 2/2"));
}

#[test]
fn fallback_stops_at_first_failing_pass() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");
    write_script(&bin, "pdflatex", "echo \"$*\" >> calls.log\nexit 1").expect("pdflatex");

    let output = texbuild(
        temp.path(),
        &bin,
        &["build", "--output-dir", "out", "--passes", "3"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert_eq!(call_count(&temp.path().join("out")), 1);
    assert!(stdout(&output).contains("=== Build failed ==="));
}

#[test]
fn no_compilers_exits_with_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("empty-bin");
    fs::create_dir(&bin).expect("bin dir");

    let output = texbuild(temp.path(), &bin, &[]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(stdout(&output).contains("[ERR] pdflatex not found on PATH"));
    assert!(!temp.path().join("output/sonoluminescence.pdf").exists());
    assert!(temp.path().join("output/sonoluminescence.tex").is_file());
}

#[test]
fn config_file_sets_pass_count() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");
    write_script(&bin, "latexmk", "exit 1").expect("latexmk");
    write_script(&bin, "pdflatex", WRITES_PDF).expect("pdflatex");
    fs::write(
        temp.path().join("texbuild.toml"),
        "output_dir = \"pdf\"\npdflatex_passes = 3\nprefer_latexmk = false\n",
    )
    .expect("config");

    let output = texbuild(temp.path(), &bin, &["build"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{}", stdout(&output));
    assert_eq!(call_count(&temp.path().join("pdf")), 3);
}

#[test]
fn invalid_config_is_reported() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");
    fs::write(temp.path().join("texbuild.toml"), "pdflatex_passes = 0\n").expect("config");

    let output = texbuild(temp.path(), &bin, &["build"]);

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pdflatex_passes must be > 0"), "{stderr}");
}

#[test]
fn write_only_emits_source() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");

    let output = texbuild(temp.path(), &bin, &["write", "--basename", "draft"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let tex = temp.path().join("output/draft.tex");
    assert_eq!(fs::read(&tex).expect("tex"), MANUSCRIPT.as_bytes());
    assert!(!temp.path().join("output/draft.texbuild.log").exists());
}

#[test]
fn tools_reports_availability() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");

    let missing = texbuild(temp.path(), &bin, &["tools"]);
    assert_eq!(missing.status.code(), Some(exit_codes::FAILED));
    assert!(stdout(&missing).contains("latexmk (primary): not found"));

    write_script(&bin, "pdflatex", "exit 0").expect("pdflatex");
    let found = texbuild(temp.path(), &bin, &["tools"]);
    assert_eq!(found.status.code(), Some(exit_codes::OK));
    assert!(
        stdout(&found)
            .lines()
            .any(|line| line.starts_with("pdflatex (fallback): ") && line.ends_with("/pdflatex"))
    );
}

#[test]
fn compiler_output_keeps_stream_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");
    write_script(
        &bin,
        "latexmk",
        "echo first-stderr >&2\nsleep 0.2\necho second-stdout\nexit 1",
    )
    .expect("latexmk");

    let output = texbuild(
        temp.path(),
        &bin,
        &["build", "--output-dir", "out", "--basename", "doc"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let console = stdout(&output);
    let first = console.find("first-stderr").expect("stderr line echoed");
    let second = console.find("second-stdout").expect("stdout line echoed");
    assert!(first < second, "{console}");
}

#[test]
fn timed_out_compiler_output_is_echoed_and_logged() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bin = temp.path().join("bin");
    fs::create_dir(&bin).expect("bin dir");
    write_script(
        &bin,
        "latexmk",
        "echo 'LaTeX stuck on line 42'\nexec /bin/sleep 30",
    )
    .expect("latexmk");

    let output = texbuild(
        temp.path(),
        &bin,
        &["build", "--output-dir", "out", "--basename", "doc", "--timeout", "1"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(stdout(&output).contains("stuck on line 42"), "{}", stdout(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timed out after 1s"), "{stderr}");
    let log = fs::read_to_string(temp.path().join("out/doc.texbuild.log")).expect("log");
    assert!(log.contains("(timed out) ==="));
    assert!(log.contains("stuck on line 42"));
}
