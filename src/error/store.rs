use reqwest::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Store is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    /// Non-2xx answer; `body` is a bounded preview kept for logs only.
    #[error("Store error: table={table}, status={status}, body={body:.200}")]
    Status {
        table: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Unconditional deletes are refused client-side.
    #[error("Refusing to delete from {0} without a filter")]
    UnfilteredDelete(&'static str),
}

impl IsRetryable for StoreError {
    /// The store client never retries on its own; callers may consult this
    /// to decide between "try again later" and "fix the request".
    fn is_retryable(&self) -> bool {
        match self {
            StoreError::ReqwestError(_) => true,
            StoreError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}
