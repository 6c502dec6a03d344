//! Configuration schema definitions using serde with validation attributes.

use lingo_common::{LanguageCode, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use validator::Validate;

use crate::loader::ConfigError;

/// Main configuration structure for Lingo.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    #[validate]
    pub server: ServerConfig,
    /// Database configuration.
    #[validate]
    pub database: DatabaseConfig,
    /// Supported languages and fallback chains.
    #[validate]
    pub locales: LocalesConfig,
    /// Translation population configuration.
    #[validate]
    pub population: PopulationConfig,
    /// External translation provider configuration.
    #[validate]
    pub provider: ProviderConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    #[validate(custom(function = "crate::validation::validate_socket_addr", message = "Bind address must be host:port"))]
    pub bind_address: String,
    /// Per-request timeout in seconds.
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub request_timeout_seconds: u64,
    /// Whether to send permissive CORS headers.
    pub enable_cors: bool,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,
    /// Maximum pool size.
    #[validate(range(min = 1, max = 64, message = "Pool size must be between 1 and 64"))]
    pub max_connections: u32,
}

/// Supported languages and the global default.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LocalesConfig {
    /// Global default language; every fallback chain ends here.
    #[validate(custom(function = "crate::validation::validate_language_code", message = "Invalid language code"))]
    pub default_language: String,
    /// Language definitions.
    #[validate(length(min = 1, message = "At least one language must be configured"))]
    pub languages: Vec<LanguageConfig>,
}

/// A single language definition.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LanguageConfig {
    /// Language tag, e.g. `ja` or `zh-TW`.
    #[validate(custom(function = "crate::validation::validate_language_code", message = "Invalid language code"))]
    pub code: String,
    /// Display name in the language itself.
    #[validate(length(min = 1, message = "Display name cannot be empty"))]
    pub display_name: String,
    /// Right-to-left script.
    #[serde(default)]
    pub rtl: bool,
    /// Whether content is populated and served in this language.
    #[serde(default = "default_true")]
    pub supported: bool,
    /// Languages tried after this one, before the global default.
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Translation population configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PopulationConfig {
    /// Population jobs running at once.
    #[validate(range(min = 1, max = 256, message = "Concurrent jobs must be between 1 and 256"))]
    pub max_concurrent_jobs: usize,
    /// Target languages translated at once within one job.
    #[validate(range(min = 1, max = 64, message = "Concurrent languages must be between 1 and 64"))]
    pub max_concurrent_languages: usize,
    /// Timeout of one provider attempt for one language, in milliseconds.
    #[validate(range(min = 100, max = 120000, message = "Provider timeout must be between 100ms and 120s"))]
    pub provider_timeout_ms: u64,
    /// Grace period for running jobs on shutdown, in seconds.
    #[validate(range(min = 1, max = 600, message = "Shutdown timeout must be between 1 and 600 seconds"))]
    pub shutdown_timeout_seconds: u64,
    /// Consecutive failures after which a language is reported as degraded.
    #[validate(range(min = 1, max = 1000))]
    pub degraded_after_failures: u32,
    /// Per-language retry policy.
    #[validate]
    pub retry: RetryConfig,
}

impl PopulationConfig {
    /// Provider timeout as a [`Duration`].
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Exponential backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per language, including the first.
    #[validate(range(min = 1, max = 10, message = "Max attempts must be between 1 and 10"))]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    #[validate(range(min = 1, max = 60000))]
    pub initial_delay_ms: u64,
    /// Upper bound for any retry delay, in milliseconds.
    #[validate(range(min = 1, max = 600000))]
    pub max_delay_ms: u64,
    /// Growth factor between consecutive delays.
    #[validate(range(min = 1.0, max = 10.0))]
    pub multiplier: f64,
}

/// Which translation provider implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// LibreTranslate-compatible HTTP API.
    Http,
    /// No provider; only source-language content is stored.
    Disabled,
}

/// External translation provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider implementation.
    pub kind: ProviderKind,
    /// Endpoint URL for [`ProviderKind::Http`].
    pub url: Option<String>,
    /// Optional API key.
    pub api_key: Option<String>,
    /// Client-side rate limit.
    #[validate(range(min = 1, max = 1000))]
    pub requests_per_second: u32,
}

impl Config {
    /// Runs field validation plus the cross-field checks derive can't express.
    pub fn validate_all(&self) -> Result<(), ConfigError> {
        self.validate()?;
        for language in &self.locales.languages {
            language.validate()?;
        }
        self.locales.check_references()?;

        if self.provider.kind == ProviderKind::Http {
            let url = self
                .provider
                .url
                .as_deref()
                .ok_or_else(|| ConfigError::Invalid("provider.url is required for the http provider".into()))?;
            crate::validation::validate_http_url(url)
                .map_err(|_| ConfigError::Invalid(format!("provider.url is not a valid http(s) URL: {url}")))?;
        }

        if self.population.retry.max_delay_ms < self.population.retry.initial_delay_ms {
            return Err(ConfigError::Invalid(
                "population.retry.max_delay_ms must not be smaller than initial_delay_ms".into(),
            ));
        }

        Ok(())
    }
}

impl LocalesConfig {
    /// Checks that codes are unique and that the default and all fallbacks exist.
    fn check_references(&self) -> Result<(), ConfigError> {
        let mut known = HashSet::new();
        for language in &self.languages {
            let code = canonical(&language.code)?;
            if !known.insert(code.clone()) {
                return Err(ConfigError::Invalid(format!("duplicate language code: {code}")));
            }
        }

        let default = canonical(&self.default_language)?;
        let default_supported = self
            .languages
            .iter()
            .any(|l| l.supported && canonical(&l.code).map(|c| c == default).unwrap_or(false));
        if !default_supported {
            return Err(ConfigError::Invalid(format!(
                "default language {default} must be listed and supported"
            )));
        }

        for language in &self.languages {
            for fallback in &language.fallbacks {
                let fallback = canonical(fallback)?;
                if !known.contains(&fallback) {
                    return Err(ConfigError::Invalid(format!(
                        "language {} falls back to unknown language {fallback}",
                        language.code
                    )));
                }
            }
        }

        Ok(())
    }
}

fn canonical(code: &str) -> Result<LanguageCode, ConfigError> {
    LanguageCode::parse(code).map_err(|e| ConfigError::Invalid(e.to_string()))
}
