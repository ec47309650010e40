use axum::response::{IntoResponse, Response};
use axum::Json;
use quill_core::CoreError;

use crate::dto::Reply;

/// Handler failure. Always rendered as a `success: false` envelope with
/// HTTP 200 so admin clients have a single response shape to handle.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{message}")]
    Fail {
        message: String,
        detail: Option<String>,
    },
    #[error("{0}")]
    Auth(String),
    #[error("internal server error")]
    Internal(String),
}

impl AppError {
    pub fn fail(message: impl Into<String>) -> Self {
        AppError::Fail {
            message: message.into(),
            detail: None,
        }
    }

    pub fn fail_with(message: impl Into<String>, detail: impl ToString) -> Self {
        AppError::Fail {
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (message, detail) = match self {
            AppError::Core(CoreError::Internal(msg)) | AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                ("internal server error".to_string(), None)
            }
            AppError::Core(CoreError::Persistence(msg)) => {
                tracing::error!("Store error: {}", msg);
                ("update failed".to_string(), Some(msg))
            }
            AppError::Core(e) => (e.to_string(), None),
            AppError::Fail { message, detail } => (message, detail),
            AppError::Auth(msg) => (msg, None),
        };

        Json(Reply::<String> {
            success: false,
            message,
            data: detail,
        })
        .into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}
