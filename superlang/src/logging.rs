//! Tracing subscriber setup

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Default filter for a given `-v` count
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing on stderr.
///
/// `RUST_LOG` wins when set; otherwise the level follows `verbosity`
/// (0 = warn, 1 = info, 2 = debug, 3+ = trace). Safe to call multiple times.
pub fn init_tracing(verbosity: u8) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

        // a subscriber installed by the host is left in place
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .try_init();
    });
}
