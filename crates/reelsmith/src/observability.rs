//! Logging setup for the binary.

use reelsmith_error::{ConfigError, ReelsmithResult};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// How log output is filtered and formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset (e.g. "info", "reelsmith=debug")
    pub log_level: String,
    /// Emit one JSON object per event
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Creates a configuration with the given default filter.
    pub fn new(log_level: impl Into<String>) -> Self {
        Self {
            log_level: log_level.into(),
            json_logs: false,
        }
    }

    /// Default filter for the `--verbose` flag.
    pub fn for_verbosity(verbose: bool) -> Self {
        Self::new(if verbose { "debug" } else { "info" })
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Filter in force: `RUST_LOG` when set, otherwise the configured level.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configured level does not parse.
    pub fn env_filter(&self) -> ReelsmithResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.log_level).map_err(|e| {
            ConfigError::new(format!("Invalid log filter {:?}: {}", self.log_level, e)).into()
        })
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// # Errors
///
/// Returns a [`ConfigError`] for an invalid filter or when a subscriber is
/// already installed.
pub fn init_observability(config: &ObservabilityConfig) -> ReelsmithResult<()> {
    let env_filter = config.env_filter()?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install logging: {}", e)))?;
    Ok(())
}
