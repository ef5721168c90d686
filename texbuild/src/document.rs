//! The manuscript compiled by `texbuild build`.
//!
//! The text is inert data: a French article on optimal transport, Fisher
//! information and the thermodynamics of sonoluminescence. It contains
//! accented characters and a table of contents, hence UTF-8 output and two
//! `pdflatex` passes by default.

/// Base name used for the `.tex`/`.pdf` pair unless configured otherwise.
pub const DEFAULT_BASENAME: &str = "sonoluminescence";

/// Full LaTeX source of the manuscript.
pub const MANUSCRIPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/sonoluminescence.tex"
));
