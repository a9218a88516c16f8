//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Finance storage collaborator configuration.
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Finance storage collaborator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the finance storage REST service.
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Opaque tenant value forwarded on every request, if any.
    #[serde(default)]
    pub tenant: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON formatted events.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "acqledger=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ACQLEDGER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("ACQLEDGER__STORAGE__BASE_URL", Some("http://localhost:9130")),
                ("ACQLEDGER__STORAGE__TIMEOUT_SECS", Some("5")),
                ("RUN_MODE", Some("test-none")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.storage.base_url, "http://localhost:9130");
                assert_eq!(config.storage.timeout_secs, 5);
                assert_eq!(config.storage.tenant, None);
                assert_eq!(config.logging.filter, "acqledger=info");
                assert!(!config.logging.json);
            },
        );
    }

    #[test]
    fn test_missing_base_url_fails() {
        temp_env::with_vars(
            [
                ("ACQLEDGER__STORAGE__BASE_URL", None::<&str>),
                ("RUN_MODE", Some("test-none")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
