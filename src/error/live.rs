use thiserror::Error as ThisError;

use super::IsRetryable;

#[derive(Debug, ThisError)]
pub enum LiveError {
    /// No API key configured; terminal for the activation attempt.
    #[error("No API key configured for the speech service")]
    NoCredential,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Connect timed out after {0}s")]
    ConnectTimeout(u64),

    /// The server closed the socket before or instead of acknowledging setup.
    #[error("Setup rejected: {0}")]
    SetupRejected(String),

    #[error("Session closed by remote: {0}")]
    Closed(String),

    #[error("Audio capture error: {0}")]
    Capture(String),

    #[error("Audio payload error: {0}")]
    AudioPayload(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for LiveError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        LiveError::WebSocket(Box::new(e))
    }
}

impl IsRetryable for LiveError {
    fn is_retryable(&self) -> bool {
        match self {
            LiveError::WebSocket(_) | LiveError::ConnectTimeout(_) | LiveError::Closed(_) => true,
            LiveError::NoCredential
            | LiveError::JsonError(_)
            | LiveError::UrlError(_)
            | LiveError::SetupRejected(_)
            | LiveError::Capture(_)
            | LiveError::AudioPayload(_) => false,
        }
    }
}

/// Rejection of a model-issued tool call before it reaches a host callback.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ToolCallError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(!LiveError::NoCredential.is_retryable());
        assert!(!LiveError::SetupRejected("bad model".to_string()).is_retryable());
        assert!(LiveError::ConnectTimeout(15).is_retryable());
        assert!(LiveError::Closed("going away".to_string()).is_retryable());
        assert!(
            LiveError::from(tokio_tungstenite::tungstenite::Error::ConnectionClosed)
                .is_retryable()
        );
    }
}
