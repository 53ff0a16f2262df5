//! Diagnostic logging.
//!
//! Events go to stderr so stdout carries only the rendered script output.
//! `SIESTA_LOG` takes an `EnvFilter` directive (`debug`, `siesta=trace`, …);
//! without it the level follows the `-v` count.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "SIESTA_LOG";

/// Default directive for a given `-v` count.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

fn env_filter(env_value: Option<&str>, verbosity: u8) -> EnvFilter {
    env_value
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(level_for(verbosity)))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbosity: u8) {
    let filter = env_filter(std::env::var(LOG_ENV).ok().as_deref(), verbosity);
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1);

    let _ = tracing_subscriber::registry()
        .with(console)
        .with(filter)
        .try_init();
}
