use serde::{Deserialize, Serialize};
use url::Url;

/// Hosted store (PostgREST endpoint) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Project base URL; tables live under `{url}/rest/v1/`.
    /// TOML: `store.url`. Required.
    #[serde(default)]
    pub url: Option<Url>,

    /// Publishable (anon) key, sent as `apikey` and as bearer token.
    /// TOML: `store.api_key`.
    #[serde(default)]
    pub api_key: String,

    /// Optional upstream HTTP proxy for store requests.
    /// TOML: `store.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Per-request timeout.
    /// TOML: `store.timeout_secs`. Default: `30`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long the public site snapshot is served from memory before re-reading the store.
    /// TOML: `store.cache_ttl_secs`. Default: `30`.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: String::new(),
            proxy: None,
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    30
}
