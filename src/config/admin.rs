use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Admin panel gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// TOML: `admin.username`. Default: `admin`.
    #[serde(default = "default_username")]
    pub username: String,

    /// TOML: `admin.password`. Must be provided.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub password: String,

    /// Idle lifetime of an admin bearer token.
    /// TOML: `admin.session_ttl_secs`. Default: `3600`.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Clicks on the hidden control needed to arm the key combo.
    /// TOML: `admin.unlock_clicks`. Default: `5`.
    #[serde(default = "default_unlock_clicks")]
    pub unlock_clicks: usize,

    /// Trailing window in which those clicks must happen.
    /// TOML: `admin.unlock_window_ms`. Default: `5000`.
    #[serde(default = "default_unlock_window_ms")]
    pub unlock_window_ms: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            // No insecure default. `Config::validate()` enforces non-empty.
            password: String::new(),
            session_ttl_secs: default_session_ttl_secs(),
            unlock_clicks: default_unlock_clicks(),
            unlock_window_ms: default_unlock_window_ms(),
        }
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for admin.password",
        )),
    }
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_session_ttl_secs() -> u64 {
    3600
}

fn default_unlock_clicks() -> usize {
    5
}

fn default_unlock_window_ms() -> u64 {
    5000
}
