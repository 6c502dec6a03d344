//! Error types for translation population

use lingo_common::LingoError;
use lingo_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single provider call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network or server-side failure that may succeed on retry
    #[error("Transient provider failure: {0}")]
    Transient(String),

    /// The provider (or our own limiter) asked us to slow down
    #[error("Provider rate limit exceeded")]
    RateLimited,

    /// The call did not finish within the per-attempt timeout
    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),

    /// The provider refused the request; retrying will not help
    #[error("Provider rejected the request (status {status:?}): {message}")]
    Rejected { status: Option<u16>, message: String },

    /// No provider is configured or it cannot be reached at all
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RateLimited | Self::Timeout(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(Duration::ZERO)
        } else if err.is_decode() {
            Self::Rejected {
                status: err.status().map(|s| s.as_u16()),
                message: format!("malformed provider response: {err}"),
            }
        } else {
            Self::Transient(err.to_string())
        }
    }
}

impl From<ProviderError> for LingoError {
    fn from(err: ProviderError) -> Self {
        match &err {
            ProviderError::Rejected { status: Some(status), .. } => {
                LingoError::provider_with_status(err.to_string(), *status)
            }
            _ => LingoError::provider(err.to_string()),
        }
    }
}

/// Failure of a whole population job or of the scheduler
#[derive(Error, Debug)]
pub enum PopulationError {
    /// Storing the source-language row failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Metrics could not be registered
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// The scheduler no longer accepts jobs
    #[error("Population scheduler is shutting down")]
    ShuttingDown,

    /// The job was aborted before it finished
    #[error("Population job was cancelled")]
    Cancelled,

    /// The provider could not be constructed
    #[error("Provider setup failed: {0}")]
    ProviderSetup(String),
}

impl From<PopulationError> for LingoError {
    fn from(err: PopulationError) -> Self {
        match err {
            PopulationError::Store(store) => store.into(),
            other => LingoError::with_source("translation population failed", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Transient("reset".into()).is_retryable());
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_retryable());

        assert!(!ProviderError::Unavailable("disabled".into()).is_retryable());
        assert!(!ProviderError::Rejected {
            status: Some(400),
            message: "bad language".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_conversion_to_lingo_error_keeps_status() {
        let err: LingoError = ProviderError::Rejected {
            status: Some(403),
            message: "invalid api key".into(),
        }
        .into();
        assert!(matches!(err, LingoError::Provider { status_code: Some(403), .. }));
    }
}
