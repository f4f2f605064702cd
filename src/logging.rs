//! Structured logging setup on top of `tracing-subscriber`.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{GraphletError, Result};

/// Directives used when neither `RUST_LOG` nor the config names any.
pub const DEFAULT_FILTER: &str = "incgraph=info";

/// `[logging]` section of the engine config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// `EnvFilter` directives, e.g. `"incgraph::census=debug"`.
    pub filter: String,
    /// Tag every line with the emitting thread.
    pub thread_ids: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            thread_ids: true,
        }
    }
}

impl LoggingOptions {
    /// Builds the filter, letting a non-empty `RUST_LOG` override the
    /// configured directives.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        self.resolve(std::env::var(EnvFilter::DEFAULT_ENV).ok())
    }

    fn resolve(&self, env: Option<String>) -> Result<EnvFilter> {
        let directives = env
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| self.filter.clone());
        EnvFilter::try_new(&directives).map_err(|e| {
            GraphletError::Config(format!("invalid log filter {directives:?}: {e}"))
        })
    }
}

/// Installs the global fmt subscriber described by `options`.
///
/// Fails with [`GraphletError::Config`] on a bad filter or when a subscriber
/// is already installed.
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    fmt()
        .with_env_filter(options.env_filter()?)
        .with_target(true)
        .with_thread_ids(options.thread_ids)
        .try_init()
        .map_err(|_| GraphletError::Config("logging already initialized".into()))
}
