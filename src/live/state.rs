use serde::Serialize;

/// Lifecycle of one assistant session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Standby,
    Connecting,
    Connected,
    Listening,
    Speaking,
    Error,
    Closing,
    Offline,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Standby | Offline, Connecting)
                | (Standby, Offline)
                | (Connecting, Connected)
                | (Connected, Listening)
                | (Listening, Speaking)
                | (Speaking, Listening)
                | (Connecting | Connected | Listening | Speaking, Error)
                | (Error, Connecting)
                | (Connecting | Connected | Listening | Speaking | Error, Closing)
                | (Connecting | Connected | Listening | Speaking | Error | Closing, Offline)
        )
    }

    /// A link is open or being opened.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionState::Connecting
                | SessionState::Connected
                | SessionState::Listening
                | SessionState::Speaking
        )
    }

    pub fn default_status(self) -> SessionStatus {
        match self {
            SessionState::Standby => SessionStatus::Standby,
            SessionState::Connecting => SessionStatus::Syncing,
            SessionState::Connected | SessionState::Listening | SessionState::Speaking => {
                SessionStatus::Connected
            }
            SessionState::Error => SessionStatus::Retrying,
            SessionState::Closing | SessionState::Offline => SessionStatus::Offline,
        }
    }
}

/// User-visible status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Standby,
    Syncing,
    Connected,
    Retrying,
    NoApiKey,
    Offline,
}

impl SessionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Standby => "STANDBY",
            SessionStatus::Syncing => "SYNCING",
            SessionStatus::Connected => "CONNECTED",
            SessionStatus::Retrying => "RETRYING",
            SessionStatus::NoApiKey => "NO_API_KEY",
            SessionStatus::Offline => "OFFLINE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub status: SessionStatus,
    pub epoch: u64,
    pub last_heard: Option<String>,
    pub scheduled_buffers: usize,
}
