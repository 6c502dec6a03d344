//! The translation provider seam

use async_trait::async_trait;
use lingo_common::LanguageCode;
use lingo_config::{ProviderConfig, ProviderKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::{PopulationError, ProviderError};
use crate::http_provider::HttpTranslationProvider;

/// External machine translation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translates `text` from `source` to `target`.
    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, ProviderError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Provider used when no translation backend is configured.
///
/// Every call fails with [`ProviderError::Unavailable`], so populated content
/// is source-language only.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

#[async_trait]
impl TranslationProvider for DisabledProvider {
    async fn translate(
        &self,
        _text: &str,
        _source: &LanguageCode,
        _target: &LanguageCode,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::Unavailable("translation provider is disabled".to_string()))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Builds the provider selected by `config`.
///
/// `request_timeout` bounds a single HTTP request; the population task
/// applies its own per-attempt timeout on top.
pub fn build_provider(
    config: &ProviderConfig,
    request_timeout: Duration,
) -> Result<Arc<dyn TranslationProvider>, PopulationError> {
    let provider: Arc<dyn TranslationProvider> = match config.kind {
        ProviderKind::Disabled => Arc::new(DisabledProvider),
        ProviderKind::Http => Arc::new(HttpTranslationProvider::from_config(config, request_timeout)?),
    };
    info!(provider = provider.name(), "Translation provider configured");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_provider_always_fails() {
        let en = LanguageCode::parse("en").unwrap();
        let ja = LanguageCode::parse("ja").unwrap();

        let err = DisabledProvider.translate("Hello", &en, &ja).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_build_provider_by_kind() {
        let disabled = build_provider(&ProviderConfig::default(), Duration::from_secs(5)).unwrap();
        assert_eq!(disabled.name(), "disabled");

        let config = ProviderConfig {
            kind: ProviderKind::Http,
            url: Some("http://127.0.0.1:5000".to_string()),
            ..ProviderConfig::default()
        };
        let http = build_provider(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(http.name(), "http");

        let missing_url = ProviderConfig {
            kind: ProviderKind::Http,
            ..ProviderConfig::default()
        };
        assert!(build_provider(&missing_url, Duration::from_secs(5)).is_err());
    }
}
