//! Tracing initialization for the CLI.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging to stderr.
///
/// Reads `MOBILITY_LOG` for per-target levels, e.g.
/// `MOBILITY_LOG=mobility_simulator_core_rs=debug`.
///
/// Falls back to `mobility_simulator_core_rs=info,mobility_sim=info` if
/// `MOBILITY_LOG` is not set or is invalid. `verbose` raises the fallback
/// to debug. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let fallback = if verbose {
            "mobility_simulator_core_rs=debug,mobility_sim=debug"
        } else {
            "mobility_simulator_core_rs=info,mobility_sim=info"
        };
        let filter =
            EnvFilter::try_from_env("MOBILITY_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
