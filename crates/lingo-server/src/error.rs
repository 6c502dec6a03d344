//! Mapping of service errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lingo_service::ServiceError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Missing or empty {0} header")]
    MissingHeader(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::Validation { .. } | ServiceError::I18n(_)) => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Service(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingHeader(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Service(ServiceError::NotFound { .. }) => "not_found",
            Self::Service(ServiceError::Validation { .. } | ServiceError::I18n(_)) => "validation",
            Self::Service(ServiceError::Unavailable(_)) => "unavailable",
            Self::Service(_) | Self::Internal(_) => "internal",
            Self::MissingHeader(_) | Self::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            // Internal details stay in the log.
            match &self {
                Self::Service(ServiceError::Unavailable(message)) => message.clone(),
                _ => "internal server error".to_string(),
            }
        } else {
            self.to_string()
        };
        let field = match &self {
            Self::Service(ServiceError::Validation { field, .. }) => Some(*field),
            _ => None,
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
            field,
        };
        (status, Json(body)).into_response()
    }
}

impl From<lingo_common::LingoError> for ApiError {
    fn from(err: lingo_common::LingoError) -> Self {
        if err.is_client_error() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
