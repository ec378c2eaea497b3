//! Logging setup.
//!
//! Use `RUST_LOG` to control verbosity, e.g. `RUST_LOG=order_reconciler=debug`.
//! Output goes to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "order_reconciler=info";

pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // A subscriber may already be installed (tests, embedding applications); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init();
}
