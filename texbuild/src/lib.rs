//! Build orchestration for the embedded sonoluminescence manuscript.
//!
//! The crate writes a fixed LaTeX document to disk and drives an external
//! typesetting toolchain (`latexmk`, falling back to `pdflatex`) to produce a
//! PDF. The layout mirrors a strict split:
//!
//! - **[`core`]**: Pure decisions (success heuristic, outcomes, formatting).
//!   No I/O.
//! - **[`io`]**: Side effects (filesystem, tool discovery, subprocesses).
//!   Each seam is a trait so tests can substitute fakes.
//!
//! [`build`] coordinates the two to implement the `texbuild build` command.

pub mod build;
pub mod core;
pub mod document;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
