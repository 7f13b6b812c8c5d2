//! Logging system setup and configuration
//!
//! Handles the initialization of the tracing-based logging system used
//! throughout the server for debugging, monitoring, and diagnostics.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Args;

/// Initialize the logging system
///
/// Sets up structured logging using the tracing crate with configurable
/// output format and filtering levels. The logging level can be
/// controlled through command-line arguments or environment variables.
///
/// # Arguments
/// * `args` - Command line arguments containing debug flag
///
/// # Returns
/// * `Result<()>` - Success or error during logging setup
///
/// # Environment Variables
/// * `RUST_LOG` - Override the default logging filter (e.g., "debug",
///   "arena_core=trace")
pub fn setup_logging(args: &Args) -> Result<()> {
    setup_logging_with_format(args, false)
}

/// Initialize logging with an optional JSON format
///
/// Alternative logging setup that can output structured JSON logs,
/// useful for log aggregation systems and machine parsing.
///
/// # Arguments
/// * `args` - Command line arguments containing debug flag
/// * `json_format` - Whether to use JSON formatting
///
/// # Returns
/// * `Result<()>` - Success or error during logging setup
pub fn setup_logging_with_format(args: &Args, json_format: bool) -> Result<()> {
    // Determine the base logging level from arguments
    let level = if args.debug { "debug" } else { "info" };

    // Respect RUST_LOG, falling back to the level from the CLI args
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_setup() {
        let args = Args::default();

        // The first call should succeed; subsequent calls fail because
        // the global logger can only be initialized once per process.
        let result = std::panic::catch_unwind(|| setup_logging(&args));
        assert!(result.is_ok() || result.is_err());
    }
}
