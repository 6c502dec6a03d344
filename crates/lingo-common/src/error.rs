//! Error types and utilities for Lingo

use thiserror::Error;

/// Result type alias for Lingo operations
pub type Result<T> = std::result::Result<T, LingoError>;

/// Main error type for Lingo operations
#[derive(Error, Debug)]
pub enum LingoError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database related errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Translation provider errors
    #[error("Translation provider error: {message}")]
    Provider {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Locale registry and language resolution errors
    #[error("Localization error: {message}")]
    Localization {
        message: String,
        locale: Option<String>,
    },

    /// A requested record does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Validation errors for user input or data
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LingoError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new database error with source
    pub fn database_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Database {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider {
            message: msg.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new provider error with an HTTP status code
    pub fn provider_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Provider {
            message: msg.into(),
            status_code: Some(status),
            source: None,
        }
    }

    /// Create a new localization error with locale
    pub fn localization_with_locale(msg: impl Into<String>, locale: impl Into<String>) -> Self {
        Self::Localization {
            message: msg.into(),
            locale: Some(locale.into()),
        }
    }

    /// Create a new not-found error
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Whether the error was caused by bad caller input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let error = LingoError::new("test message");
        assert!(error.to_string().contains("test message"));

        let config_error = LingoError::config("config issue");
        assert_eq!(config_error.to_string(), "Configuration error: config issue");

        let provider_error = LingoError::provider_with_status("quota exceeded", 429);
        assert_eq!(provider_error.to_string(), "Translation provider error: quota exceeded");

        let validation_error = LingoError::validation_field("Invalid input", "language");
        assert!(validation_error.to_string().contains("Validation error"));

        let localization_error = LingoError::localization_with_locale("Unknown language", "xx");
        assert!(localization_error.to_string().contains("Localization error"));
    }

    #[test]
    fn test_not_found_display() {
        let error = LingoError::not_found("entity", "abc");
        assert_eq!(error.to_string(), "entity not found: abc");
        assert!(error.is_client_error());
        assert!(!LingoError::config("boom").is_client_error());
    }

    #[test]
    fn test_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let wrapped_error = LingoError::with_source("Failed to read file", io_error);

        assert!(wrapped_error.to_string().contains("Failed to read file"));
        assert!(wrapped_error.source().is_some());

        let db_error = LingoError::database_with_source(
            "Query failed",
            io::Error::new(io::ErrorKind::PermissionDenied, "Access denied"),
        );
        assert!(db_error.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let lingo_error: LingoError = io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(matches!(lingo_error, LingoError::Io(_)));
        assert!(!lingo_error.is_client_error());
    }
}
