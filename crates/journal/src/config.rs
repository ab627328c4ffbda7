//! Service configuration.
//!
//! Loaded from a YAML file and then overridden by `JOURNAL__<SECTION>__<KEY>`
//! environment variables, e.g. `JOURNAL__NASA_API__API_KEY`. Every field except
//! `nasa_api.api_key` has a default.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::policy::PollPolicy;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "JOURNAL";

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The file or an override could not be read or deserialized.
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was read but is not acceptable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Deployment environment, which selects the log format and level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Developer machine: human-readable logs at debug level.
    #[default]
    Local,
    /// Shared development: JSON logs at debug level.
    Dev,
    /// Production: JSON logs at info level.
    Prod,
}

impl Environment {
    /// Returns the lowercase name used in config files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read API listener settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    /// `host:port` to bind.
    pub address: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Upper bound on graceful shutdown in seconds.
    pub shutdown_timeout_secs: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            address: "localhost:8080".to_string(),
            request_timeout_secs: 4,
            shutdown_timeout_secs: 5,
        }
    }
}

impl HttpServerConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Upper bound on graceful shutdown.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Journal database settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database file.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("journal.db"),
        }
    }
}

/// NASA APOD API settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct NasaApiConfig {
    /// API base URL.
    #[serde(default = "default_nasa_base_url")]
    pub base_url: String,
    /// API key from api.nasa.gov.
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_nasa_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_nasa_base_url() -> String {
    journal_nasa::NASA_API_BASE_URL.to_string()
}

const fn default_nasa_timeout_secs() -> u64 {
    journal_nasa::DEFAULT_TIMEOUT.as_secs()
}

impl fmt::Debug for NasaApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NasaApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl NasaApiConfig {
    /// Request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Ingestion worker timing, in seconds.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Wait after an insert or a store failure.
    pub poll_interval_secs: u64,
    /// Wait after a fetch failure.
    pub fetch_retry_interval_secs: u64,
    /// Wait after a duplicate while below the threshold.
    pub duplicate_retry_interval_secs: u64,
    /// Consecutive duplicates before the wait escalates.
    pub duplicate_threshold: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            poll_interval_secs: policy.poll_interval.as_secs(),
            fetch_retry_interval_secs: policy.fetch_retry_interval.as_secs(),
            duplicate_retry_interval_secs: policy.duplicate_retry_interval.as_secs(),
            duplicate_threshold: policy.duplicate_threshold,
        }
    }
}

impl From<&WorkerConfig> for PollPolicy {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            fetch_retry_interval: Duration::from_secs(config.fetch_retry_interval_secs),
            duplicate_retry_interval: Duration::from_secs(config.duplicate_retry_interval_secs),
            duplicate_threshold: config.duplicate_threshold,
        }
    }
}

/// Top-level service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Deployment environment.
    #[serde(default)]
    pub env: Environment,
    /// Read API listener.
    #[serde(default)]
    pub http_server: HttpServerConfig,
    /// Journal database.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Record source.
    pub nasa_api: NasaApiConfig,
    /// Ingestion worker timing.
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl AppConfig {
    /// Loads and validates configuration from a YAML file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` is not a file,
    /// [`ConfigError::Load`] if it cannot be parsed, and
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path.as_ref(), None)
    }

    fn load_with_env(
        path: &Path,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let overrides = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let app: Self = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Yaml))
            .add_source(overrides)
            .build()?
            .try_deserialize()?;

        app.validate()?;
        Ok(app)
    }

    /// Checks values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.nasa_api.api_key.trim().is_empty() {
            return invalid("nasa_api.api_key must not be empty");
        }
        if self.nasa_api.base_url.trim().is_empty() {
            return invalid("nasa_api.base_url must not be empty");
        }
        if self.storage.path.as_os_str().is_empty() {
            return invalid("storage.path must not be empty");
        }
        if !is_host_port(&self.http_server.address) {
            return Err(ConfigError::Invalid(format!(
                "http_server.address must be host:port, got {:?}",
                self.http_server.address
            )));
        }

        let positive = [
            ("http_server.request_timeout_secs", self.http_server.request_timeout_secs),
            ("http_server.shutdown_timeout_secs", self.http_server.shutdown_timeout_secs),
            ("nasa_api.request_timeout_secs", self.nasa_api.request_timeout_secs),
            ("worker.poll_interval_secs", self.worker.poll_interval_secs),
            ("worker.fetch_retry_interval_secs", self.worker.fetch_retry_interval_secs),
            ("worker.duplicate_retry_interval_secs", self.worker.duplicate_retry_interval_secs),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{key} must be greater than zero")));
        }

        if self.worker.duplicate_threshold == 0 {
            return invalid("worker.duplicate_threshold must be at least 1");
        }

        Ok(())
    }

    /// Poll policy for the ingestion worker.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::from(&self.worker)
    }
}

fn is_host_port(address: &str) -> bool {
    address
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
}
