//! Real-time voice session manager.
//!
//! A [`SessionHandle`] drives one ractor actor that owns the link to the
//! speech service, the capture forwarder and the playback scheduler.

mod host;
mod session;
mod state;
pub mod tools;
mod transport;

pub use host::{AssistantHost, AudioInput, AudioOutput};
pub use session::{SessionArgs, SessionHandle, SessionSettings};
pub use state::{SessionSnapshot, SessionState, SessionStatus};
pub use tools::ToolAction;
pub use transport::{LiveConnector, LiveLink, WsConnector};
