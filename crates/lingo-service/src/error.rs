//! Service-level errors

use lingo_common::LingoError;
use lingo_i18n::I18nError;
use lingo_population::PopulationError;
use lingo_store::StoreError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors returned to API handlers.
///
/// Provider failures never appear here; population reports them through
/// its own channels.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Population could not be scheduled, e.g. during shutdown
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    I18n(#[from] I18nError),

    #[error(transparent)]
    Population(PopulationError),
}

impl ServiceError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether the caller can fix the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Validation { .. } | Self::I18n(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EntityMissing(id) => Self::not_found("entity", id),
            StoreError::UnknownLanguage(code) => Self::validation("language", format!("unknown language '{code}'")),
            other => Self::Store(other),
        }
    }
}

impl From<PopulationError> for ServiceError {
    fn from(err: PopulationError) -> Self {
        match err {
            PopulationError::ShuttingDown => Self::Unavailable("population is shutting down".to_string()),
            PopulationError::Store(store) => store.into(),
            other => Self::Population(other),
        }
    }
}

impl From<ServiceError> for LingoError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { resource, id } => LingoError::not_found(resource, id),
            ServiceError::Validation { field, message } => LingoError::validation_field(message, field),
            ServiceError::Unavailable(message) => LingoError::new(message),
            ServiceError::Store(err) => err.into(),
            ServiceError::I18n(err) => err.into(),
            ServiceError::Population(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_common::EntityId;

    #[test]
    fn test_store_errors_map_to_caller_errors() {
        let id = EntityId::new();
        let err: ServiceError = StoreError::EntityMissing(id).into();
        assert!(matches!(err, ServiceError::NotFound { resource: "entity", .. }));

        let err: ServiceError = StoreError::UnknownLanguage("xx".into()).into();
        assert!(err.is_client_error());

        let err: ServiceError = PopulationError::ShuttingDown.into();
        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_conversion_to_lingo_error() {
        let err: LingoError = ServiceError::not_found("entity", "abc").into();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "entity not found: abc");
    }
}
