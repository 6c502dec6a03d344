//! Error types for locale registry operations

use thiserror::Error;

/// Errors that can occur while building or mutating the locale registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum I18nError {
    /// Failed to parse a language identifier
    #[error("Invalid language identifier: {0}")]
    InvalidLanguageId(String),

    /// The language is not registered
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// The same language was registered twice
    #[error("Duplicate language: {0}")]
    DuplicateLanguage(String),

    /// The default language is missing or not supported
    #[error("Default language {0} must be registered and supported")]
    InvalidDefault(String),

    /// A fallback references a language that is not registered
    #[error("Language {language} falls back to unknown language {fallback}")]
    UnknownFallback { language: String, fallback: String },

    /// The default language cannot be removed from the supported set
    #[error("Cannot retire the default language {0}")]
    DefaultLanguageRetired(String),
}

impl I18nError {
    /// The language tag the error is about.
    pub fn locale(&self) -> &str {
        match self {
            Self::InvalidLanguageId(code)
            | Self::UnknownLanguage(code)
            | Self::DuplicateLanguage(code)
            | Self::InvalidDefault(code)
            | Self::DefaultLanguageRetired(code) => code,
            Self::UnknownFallback { language, .. } => language,
        }
    }
}

impl From<I18nError> for lingo_common::LingoError {
    fn from(err: I18nError) -> Self {
        let locale = err.locale().to_string();
        lingo_common::LingoError::localization_with_locale(err.to_string(), locale)
    }
}

/// Result type for i18n operations
pub type I18nResult<T> = Result<T, I18nError>;
