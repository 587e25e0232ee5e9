use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;
use tracing::{error, warn};

use super::IsRetryable;
use super::live::LiveError;
use super::store::StoreError;

#[derive(Debug, ThisError)]
pub enum NylahError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Live(#[from] LiveError),

    /// Services were deleted but could not be re-inserted; the store is left
    /// without a catalog until the next successful save.
    #[error("Partial save after {stage}: {source}")]
    PartialSave {
        stage: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl From<JsonRejection> for NylahError {
    fn from(rejection: JsonRejection) -> Self {
        NylahError::InvalidRequest(rejection.body_text())
    }
}

impl IsRetryable for NylahError {
    fn is_retryable(&self) -> bool {
        match self {
            NylahError::Store(e) => e.is_retryable(),
            NylahError::Live(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl IntoResponse for NylahError {
    fn into_response(self) -> Response {
        let (status, error_body) = match self {
            NylahError::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_REQUEST".to_string(),
                    message,
                    details: None,
                },
            ),

            NylahError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorObject {
                    code: "UNAUTHORIZED".to_string(),
                    message: "CREDENTIALS_REJECTED".to_string(),
                    details: None,
                },
            ),

            NylahError::Store(e) => {
                warn!(error = %e, "[Store] request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiErrorObject {
                        code: "STORE_ERROR".to_string(),
                        message: "The data store could not complete the request.".to_string(),
                        details: None,
                    },
                )
            }

            NylahError::PartialSave { stage, source } => {
                error!(stage, error = %source, "[Store] settings save left partially applied");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorObject {
                        code: "PARTIAL_SAVE".to_string(),
                        message: "Settings were only partially saved; save again.".to_string(),
                        details: Some(Value::String(stage.to_string())),
                    },
                )
            }

            NylahError::Live(_) | NylahError::RactorError(_) | NylahError::UnexpectedError(_) => {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorObject {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred.".to_string(),
                        details: None,
                    },
                )
            }
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
