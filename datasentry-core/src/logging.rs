//! Tracing subscriber setup for the CLI and embedding services.

use crate::Result;

/// Maps the CLI verbosity flags onto a tracing level.
///
/// `quiet` wins over any `-v` count; otherwise each repetition raises the
/// ceiling one step, from INFO through DEBUG to TRACE.
fn level_for(quiet: bool, verbose: u8) -> tracing::Level {
    if quiet {
        return tracing::Level::ERROR;
    }
    match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Installs the global tracing subscriber.
///
/// Fails with a configuration error when a subscriber is already set, so
/// a second initialization surfaces instead of being silently ignored.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level_for(quiet, verbose))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::DataSentryError::config(format!("failed to initialize logging: {}", e))
        })
}
