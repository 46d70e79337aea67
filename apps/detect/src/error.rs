//! # Application Errors
//!
//! [`AppError`] covers everything outside the pure core: file I/O, model
//! loading and the HTTP boundary. Core errors are wrapped unchanged.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use detect_core::{DetectError, Diagnostic};
use std::path::PathBuf;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model failed to load: {0}")]
    Load(Diagnostic),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status for this error.
    ///
    /// Problems with the submitted selection or the model's data are `422`;
    /// anything else is a server fault.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Detect(DetectError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Detect(_) | Self::Load(_) | Self::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = %status, error = %self, "request failed");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
