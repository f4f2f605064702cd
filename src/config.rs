//! TOML configuration for a census run.
//!
//! ```toml
//! [load]
//! delimiter = ","
//! strict = true
//!
//! [census]
//! penalized_graphlet = "diamond"
//!
//! [metrics]
//! enabled = ["graphlet-census", "max-fan-out"]
//!
//! [logging]
//! filter = "incgraph::census=debug"
//! ```
//!
//! Every section and key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::census::CensusOptions;
use crate::logging::LoggingOptions;
use crate::network::LoadOptions;
use crate::types::GraphletError;

/// Failures while reading or writing an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File being parsed, or `<inline>` for strings.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// The config could not be rendered as TOML.
    #[error("failed to serialize config: {source}")]
    Serialize {
        /// Underlying TOML error.
        source: toml::ser::Error,
    },
}

impl From<ConfigError> for GraphletError {
    fn from(err: ConfigError) -> Self {
        GraphletError::Config(err.to_string())
    }
}

/// `[metrics]` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    /// Registered metric names to build, in order.
    pub enabled: Vec<String>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: vec!["graphlet-census".to_string()],
        }
    }
}

/// Whole configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Edge-list parsing.
    pub load: LoadOptions,
    /// Census engine knobs.
    pub census: CensusOptions,
    /// Metrics to build.
    pub metrics: MetricsSection,
    /// Subscriber installed by [`crate::init_logging`].
    pub logging: LoggingOptions,
}

impl EngineConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Renders the config as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|source| ConfigError::Serialize { source })
    }
}
