//! Domain-specific error types for narrative-intel

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the narrative analysis engine
#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Story repository failed to answer a query (connectivity, corrupt corpus, ...).
    #[error("Repository error: {message}")]
    Repository { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl NarrativeError {
    pub fn repository(message: impl Into<String>) -> Self {
        NarrativeError::Repository {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        NarrativeError::NotFound {
            message: message.into(),
        }
    }

    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            NarrativeError::Config { .. } => (StatusCode::BAD_REQUEST, "Configuration error"),
            NarrativeError::Repository { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Repository error")
            }
            NarrativeError::Serialization { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error")
            }
            NarrativeError::Validation { .. } => (StatusCode::BAD_REQUEST, "Validation error"),
            NarrativeError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not found"),
            NarrativeError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl From<anyhow::Error> for NarrativeError {
    fn from(err: anyhow::Error) -> Self {
        NarrativeError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for NarrativeError {
    fn from(err: serde_json::Error) -> Self {
        NarrativeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for NarrativeError {
    fn from(err: std::io::Error) -> Self {
        NarrativeError::Repository {
            message: format!("I/O failure: {}", err),
        }
    }
}

impl From<chrono::ParseError> for NarrativeError {
    fn from(err: chrono::ParseError) -> Self {
        NarrativeError::Validation {
            message: format!("Date parsing error: {}", err),
        }
    }
}

/// Convert NarrativeError to a JSON error response
impl IntoResponse for NarrativeError {
    fn into_response(self) -> Response {
        let (status, label) = self.status_and_label();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        let details = match &self {
            NarrativeError::Config { message }
            | NarrativeError::Repository { message }
            | NarrativeError::Serialization { message }
            | NarrativeError::Validation { message }
            | NarrativeError::NotFound { message }
            | NarrativeError::Internal { message } => message.clone(),
        };
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            json!({
                "error": {
                    "code": status.as_u16(),
                    "message": format!("{label}: {details}"),
                }
            })
            .to_string(),
        )
            .into_response()
    }
}

/// Result type alias for narrative analysis operations
pub type Result<T> = std::result::Result<T, NarrativeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_surface_as_repository_failures() {
        let err: NarrativeError = std::io::Error::other("connection reset").into();
        assert!(matches!(err, NarrativeError::Repository { .. }));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = NarrativeError::not_found("initiative x").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn repository_maps_to_500() {
        let resp = NarrativeError::repository("down").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
