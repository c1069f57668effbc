//! Logging initialization.
//!
//! Log level defaults are derived from the `-v` count so normal CLI output
//! stays clean; `RUST_LOG` always takes precedence when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// `verbosity` maps to the default filter: 0 = `warn`, 1 = `info`,
/// 2 = `debug`, 3+ = `trace`. The `RUST_LOG` environment variable, when
/// set, overrides the default.
pub fn init(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
