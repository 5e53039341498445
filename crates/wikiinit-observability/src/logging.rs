//! Structured logging setup
//!
//! Installs a global `tracing` subscriber built from `LoggingConfig`. The
//! `RUST_LOG` environment variable, when set, adds directives on top of the
//! configured base level. Logs go to stderr so command output on stdout
//! stays machine-readable.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Parse the configured level, falling back to INFO
    pub fn level(&self) -> Level {
        match self.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Build the filter: configured level plus any `RUST_LOG` directives
    pub fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::new(self.level().to_string());

        if let Ok(extra) = std::env::var("RUST_LOG") {
            for directive in extra.split(',').filter(|d| !d.trim().is_empty()) {
                match directive.parse() {
                    Ok(directive) => filter = filter.add_directive(directive),
                    Err(e) => eprintln!(
                        "Warning: ignoring RUST_LOG directive '{}': {}",
                        directive, e
                    ),
                }
            }
        }

        filter
    }
}

/// Install the global subscriber
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(config.env_filter());

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}
