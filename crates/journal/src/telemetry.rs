//! Logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::Environment;

/// Error returned when a global subscriber is already installed.
pub type TelemetryError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Default filter directive for an environment.
///
/// `RUST_LOG` takes precedence when set.
#[must_use]
pub const fn default_level(env: Environment) -> &'static str {
    match env {
        Environment::Local | Environment::Dev => "debug",
        Environment::Prod => "info",
    }
}

/// Installs the global `tracing` subscriber for `env`.
///
/// `local` logs human-readable text; `dev` and `prod` log one JSON object per line.
///
/// # Errors
///
/// Fails if a global subscriber has already been set.
pub fn init(env: Environment) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(env)));

    match env {
        Environment::Local => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        Environment::Dev | Environment::Prod => tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(filter)
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels() {
        assert_eq!(default_level(Environment::Local), "debug");
        assert_eq!(default_level(Environment::Dev), "debug");
        assert_eq!(default_level(Environment::Prod), "info");
    }
}
