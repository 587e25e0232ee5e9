mod form;
mod live;
mod nylah;
mod store;

pub use form::FormError;
pub use live::{LiveError, ToolCallError};
pub use nylah::{ApiErrorBody, ApiErrorObject, NylahError};
pub use store::StoreError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
