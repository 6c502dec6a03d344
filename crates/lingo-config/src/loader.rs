//! Configuration loading utilities

use crate::Config;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "LINGO_CONFIG_PATH";

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lingo.yaml";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Field validation error
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Cross-field consistency error
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for lingo_common::LingoError {
    fn from(err: ConfigError) -> Self {
        lingo_common::LingoError::config_with_source("failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration, applies `LINGO_*` overrides, and validates it.
    ///
    /// The file is taken from `path`, then `LINGO_CONFIG_PATH`, then
    /// `./lingo.yaml`. Defaults are used when none of these exist.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let resolved = path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .or_else(|| {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                fallback.exists().then_some(fallback)
            });

        let mut config = match resolved {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                Self::parse_file(&path)?
            }
            None => {
                info!("No configuration file found, using defaults");
                Config::default()
            }
        };

        Self::apply_overrides_from(&mut config, |var| env::var(var).ok())?;
        config.validate_all()?;
        Ok(config)
    }

    /// Loads and validates a single file without environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let config = Self::parse_file(path.as_ref())?;
        config.validate_all()?;
        Ok(config)
    }

    /// Parses and validates YAML content.
    pub fn from_yaml_str(content: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Parses and validates TOML content.
    pub fn from_toml_str(content: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate_all()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Applies overrides read through `lookup`, normally `std::env::var`.
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LINGO_DATABASE_URL") {
            debug!("Overriding database.url from environment");
            config.database.url = url;
        }

        if let Some(max_connections) = lookup("LINGO_DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections =
                max_connections.parse().map_err(|e| ConfigError::EnvParse {
                    var: "LINGO_DATABASE_MAX_CONNECTIONS".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Some(bind_address) = lookup("LINGO_BIND_ADDRESS") {
            config.server.bind_address = bind_address;
        }

        if let Some(url) = lookup("LINGO_PROVIDER_URL") {
            config.provider.url = Some(url);
        }

        if let Some(api_key) = lookup("LINGO_PROVIDER_API_KEY") {
            config.provider.api_key = Some(api_key);
        }

        if let Some(kind) = lookup("LINGO_PROVIDER_KIND") {
            config.provider.kind =
                serde_yaml::from_str(&kind).map_err(|e| ConfigError::EnvParse {
                    var: "LINGO_PROVIDER_KIND".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Some(language) = lookup("LINGO_DEFAULT_LANGUAGE") {
            config.locales.default_language = language;
        }

        if let Some(timeout) = lookup("LINGO_PROVIDER_TIMEOUT_MS") {
            config.population.provider_timeout_ms =
                timeout.parse().map_err(|e| ConfigError::EnvParse {
                    var: "LINGO_PROVIDER_TIMEOUT_MS".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Some(level) = lookup("LINGO_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(file) = lookup("LINGO_LOG_FILE") {
            config.logging.file_path = Some(file);
        }

        Ok(())
    }
}
