//! Tool discovery on the executable search path.
//!
//! The [`ToolLocator`] trait decouples the orchestrator from the real `PATH`.
//! Tests use a fixed table (`test_support::StaticLocator`) or point
//! [`PathLocator`] at a temp directory of fake executables.

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::debug;

/// Resolves a program name to an executable path.
pub trait ToolLocator {
    /// `None` when the program is not installed.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Locator backed by the `which` crate.
#[derive(Debug, Clone, Default)]
pub struct PathLocator {
    /// Overrides `PATH` when set.
    search_path: Option<OsString>,
}

impl PathLocator {
    /// Search the process's `PATH`.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Search only the given `PATH`-style list of directories.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl ToolLocator for PathLocator {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(program, Some(paths), cwd)
            }
            None => which::which(program),
        };
        match found {
            Ok(path) => {
                debug!(program, path = %path.display(), "located tool");
                Some(path)
            }
            Err(err) => {
                debug!(program, err = %err, "tool not found");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let locator = PathLocator::with_search_path(temp.path().as_os_str());
        assert!(locator.locate("definitely-not-a-latex-tool").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn finds_executable_in_search_path() {
        use crate::test_support::write_script;

        let temp = tempfile::tempdir().expect("tempdir");
        let script = write_script(temp.path(), "latexmk", "exit 0").expect("script");
        let locator = PathLocator::with_search_path(temp.path().as_os_str());
        let found = locator.locate("latexmk").expect("latexmk on search path");
        assert_eq!(
            found.canonicalize().expect("canonical found"),
            script.canonicalize().expect("canonical script")
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_ignored() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("pdflatex"), "not a program").expect("write");
        let locator = PathLocator::with_search_path(temp.path().as_os_str());
        assert!(locator.locate("pdflatex").is_none());
    }
}
