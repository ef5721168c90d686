//! Development-time tracing for debugging builds.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not part of the build's product output.
//!
//! - **Console output (`build`)**: `[RUN]`/`[OK]`/`[ERR]` lines on stdout and
//!   the raw build log (`io/build_log`). Always written, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset (`debug` when
/// `verbose` is set). Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=texbuild=debug cargo run -- build
/// ```
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
