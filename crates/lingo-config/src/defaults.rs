//! Default values for every configuration section.

use crate::schema::{
    Config, DatabaseConfig, LanguageConfig, LocalesConfig, PopulationConfig, ProviderConfig,
    ProviderKind, RetryConfig, ServerConfig,
};
use lingo_common::LoggingConfig;

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            locales: LocalesConfig::default(),
            population: PopulationConfig::default(),
            provider: ProviderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_seconds: 30,
            enable_cors: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://lingo.db".to_string(),
            max_connections: 8,
        }
    }
}

impl Default for LocalesConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            languages: vec![
                LanguageConfig::new("en", "English"),
                LanguageConfig::new("ja", "日本語").with_fallbacks(&["en"]),
                LanguageConfig::new("zh", "中文"),
                LanguageConfig::new("zh-TW", "繁體中文").with_fallbacks(&["zh"]),
                LanguageConfig::new("ko", "한국어"),
            ],
        }
    }
}

impl LanguageConfig {
    /// A supported, left-to-right language without explicit fallbacks.
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            rtl: false,
            supported: true,
            fallbacks: Vec::new(),
        }
    }

    /// Sets the fallback languages.
    pub fn with_fallbacks(mut self, fallbacks: &[&str]) -> Self {
        self.fallbacks = fallbacks.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Marks the language as right-to-left.
    pub fn rtl(mut self) -> Self {
        self.rtl = true;
        self
    }

    /// Marks the language as not supported.
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 16,
            max_concurrent_languages: 4,
            provider_timeout_ms: 10_000,
            shutdown_timeout_seconds: 30,
            degraded_after_failures: 3,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            multiplier: 2.0,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Disabled,
            url: None,
            api_key: None,
            requests_per_second: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate_all().expect("defaults must validate");
    }

    #[test]
    fn test_default_locales() {
        let locales = LocalesConfig::default();
        assert_eq!(locales.default_language, "en");
        assert!(locales.languages.iter().any(|l| l.code == "ja"));

        let zh_tw = locales.languages.iter().find(|l| l.code == "zh-TW").unwrap();
        assert_eq!(zh_tw.fallbacks, vec!["zh"]);
    }

    #[test]
    fn test_language_builders() {
        let arabic = LanguageConfig::new("ar", "العربية").rtl().unsupported();
        assert!(arabic.rtl);
        assert!(!arabic.supported);
        assert!(arabic.fallbacks.is_empty());
    }
}
