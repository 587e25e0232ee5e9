use thiserror::Error as ThisError;

use super::live::ToolCallError;
use super::nylah::NylahError;

/// A site form that cannot be stored as submitted.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl From<FormError> for NylahError {
    fn from(e: FormError) -> Self {
        NylahError::InvalidRequest(e.to_string())
    }
}

impl From<FormError> for ToolCallError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::MissingField(name) => ToolCallError::MissingArgument(name),
            FormError::InvalidField { field, reason } => {
                ToolCallError::InvalidArgument { name: field, reason }
            }
        }
    }
}
