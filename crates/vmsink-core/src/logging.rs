//! Structured logging setup for the `vmsink` binary.
//!
//! Logs always go to stderr so stdout stays free for command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log line encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logging options gathered from global CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub quiet: bool,
    pub format: LogFormat,
}

impl LogOptions {
    /// Level used when `RUST_LOG` is not set.
    pub fn default_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// Install the global subscriber. Call once at startup; later calls are
/// ignored.
pub fn init_logging(options: &LogOptions) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_level()));

    let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = match options.format {
        LogFormat::Json => Box::new(fmt::layer().json().with_writer(std::io::stderr)),
        LogFormat::Text => Box::new(fmt::layer().with_writer(std::io::stderr)),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels() {
        assert_eq!(LogOptions::default().default_level(), "info");
        let verbose = LogOptions {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(verbose.default_level(), "debug");
        let quiet = LogOptions {
            verbose: true,
            quiet: true,
            ..Default::default()
        };
        assert_eq!(quiet.default_level(), "warn");
    }
}
