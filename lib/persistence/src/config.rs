//! Persistence configuration.
//!
//! Loaded via the `config` crate, either from `CALLFLOW_`-prefixed
//! environment variables or from a file.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration for [`HttpFlowClient`](crate::HttpFlowClient).
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Base URL of the flow service, e.g. `https://api.example.com/api`.
    pub base_url: String,

    /// Bearer token sent with every request.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl PersistenceConfig {
    /// Creates a configuration with the default timeout and no token.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Loads configuration from environment variables.
    ///
    /// Reads `CALLFLOW_BASE_URL`, `CALLFLOW_API_TOKEN` and
    /// `CALLFLOW_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("CALLFLOW")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Loads configuration from a file; the format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or doesn't match.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }
}
