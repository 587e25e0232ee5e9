use serde::{Deserialize, Serialize};
use url::Url;

/// Remote speech session (Gemini Live) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LiveConfig {
    /// API key for the speech service. Empty means sessions end in `NO_API_KEY`.
    /// TOML: `live.api_key`.
    #[serde(default)]
    pub api_key: String,

    /// Bidirectional streaming endpoint.
    /// TOML: `live.ws_url`.
    #[serde(default = "default_ws_url")]
    pub ws_url: Url,

    /// Model id, without the `models/` prefix.
    /// TOML: `live.model`.
    #[serde(default = "default_model")]
    pub model: String,

    /// Prebuilt voice name.
    /// TOML: `live.voice`. Default: `Kore`.
    #[serde(default = "default_voice")]
    pub voice: String,

    /// System instruction used when the admin settings carry none.
    /// TOML: `live.default_instructions`.
    #[serde(default = "default_instructions")]
    pub default_instructions: String,

    /// Text seed sent right after the session opens so the assistant greets first.
    /// TOML: `live.greeting`.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Reconnect attempts after a transport error before going offline.
    /// TOML: `live.reconnect_max_times`. Default: `3`.
    #[serde(default = "default_reconnect_max_times")]
    pub reconnect_max_times: usize,

    /// Upper bound for opening the WebSocket and completing setup.
    /// TOML: `live.connect_timeout_secs`. Default: `15`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            ws_url: default_ws_url(),
            model: default_model(),
            voice: default_voice(),
            default_instructions: default_instructions(),
            greeting: default_greeting(),
            reconnect_max_times: default_reconnect_max_times(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl LiveConfig {
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

fn default_ws_url() -> Url {
    Url::parse(
        "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent",
    )
    .expect("valid Gemini Live endpoint URL")
}

fn default_model() -> String {
    "gemini-2.5-flash-native-audio-preview-12-2025".to_string()
}

fn default_voice() -> String {
    "Kore".to_string()
}

fn default_instructions() -> String {
    "Your name is Nylah. You are the assistant of Virtual Network Chile. \
     Answer in a professional, futuristic and helpful way."
        .to_string()
}

fn default_greeting() -> String {
    "Greet the visitor as Nylah and offer help with the Virtual Network catalog.".to_string()
}

fn default_reconnect_max_times() -> usize {
    3
}

fn default_connect_timeout_secs() -> u64 {
    15
}
