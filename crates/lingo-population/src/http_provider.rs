//! LibreTranslate-compatible HTTP provider

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use lingo_common::LanguageCode;
use lingo_config::ProviderConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{PopulationError, ProviderError};
use crate::provider::TranslationProvider;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Calls `POST {url}/translate` with a LibreTranslate-style JSON body.
///
/// Requests are throttled client-side to `requests_per_second`.
pub struct HttpTranslationProvider {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    limiter: DefaultDirectRateLimiter,
}

impl HttpTranslationProvider {
    /// Creates a provider for the given base URL.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        requests_per_second: u32,
        request_timeout: Duration,
    ) -> Result<Self, PopulationError> {
        let mut endpoint = Url::parse(base_url)
            .map_err(|e| PopulationError::ProviderSetup(format!("invalid provider url {base_url}: {e}")))?;
        endpoint
            .path_segments_mut()
            .map_err(|_| PopulationError::ProviderSetup(format!("provider url {base_url} cannot be a base")))?
            .pop_if_empty()
            .push("translate");

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("lingo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PopulationError::ProviderSetup(e.to_string()))?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            endpoint,
            api_key,
            limiter: RateLimiter::direct(Quota::per_second(rate)),
        })
    }

    /// Creates a provider from the `provider` configuration section.
    pub fn from_config(config: &ProviderConfig, request_timeout: Duration) -> Result<Self, PopulationError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| PopulationError::ProviderSetup("provider.url is not set".to_string()))?;
        Self::new(url, config.api_key.clone(), config.requests_per_second, request_timeout)
    }

    /// The resolved `/translate` endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn classify_status(status: StatusCode, message: String) -> ProviderError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        ProviderError::Transient(format!("{status}: {message}"))
    } else {
        ProviderError::Rejected {
            status: Some(status.as_u16()),
            message,
        }
    }
}

#[async_trait]
impl TranslationProvider for HttpTranslationProvider {
    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, ProviderError> {
        self.limiter.until_ready().await;

        let request = TranslateRequest {
            q: text,
            source: source.as_str(),
            target: target.as_str(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self.client.post(self.endpoint.clone()).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            warn!(%status, %source, %target, %message, "Provider returned an error");
            return Err(classify_status(status, message));
        }

        let body: TranslateResponse = response.json().await?;
        debug!(%source, %target, chars = text.chars().count(), "Provider translated text");
        Ok(body.translated_text)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_translate() {
        let provider =
            HttpTranslationProvider::new("http://localhost:5000", None, 5, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.endpoint().as_str(), "http://localhost:5000/translate");

        let provider =
            HttpTranslationProvider::new("http://localhost/api/", None, 5, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.endpoint().as_str(), "http://localhost/api/translate");

        let provider =
            HttpTranslationProvider::new("http://localhost/api", None, 5, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.endpoint().as_str(), "http://localhost/api/translate");
    }

    #[test]
    fn test_non_base_url_is_setup_error() {
        let result = HttpTranslationProvider::new("mailto:ops@example.com", None, 5, Duration::from_secs(5));
        assert!(matches!(result, Err(PopulationError::ProviderSetup(_))));
    }

    #[test]
    fn test_invalid_url_is_setup_error() {
        let result = HttpTranslationProvider::new("not a url", None, 5, Duration::from_secs(5));
        assert!(matches!(result, Err(PopulationError::ProviderSetup(_))));
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ProviderError::RateLimited
        );
        assert!(classify_status(StatusCode::BAD_GATEWAY, "down".into()).is_retryable());
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, "unsupported target".into()),
            ProviderError::Rejected {
                status: Some(400),
                message: "unsupported target".into()
            }
        );
    }

    #[test]
    fn test_request_omits_missing_api_key() {
        let request = TranslateRequest {
            q: "Hello",
            source: "en",
            target: "ja",
            format: "text",
            api_key: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["q"], "Hello");
        assert!(json.get("api_key").is_none());
    }
}
