mod admin;
mod basic;
mod live;
mod store;

pub use admin::AdminConfig;
pub use basic::BasicConfig;
pub use live::LiveConfig;
pub use store::StoreConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Hosted store connection (see `store` table in config.toml).
    #[serde(default)]
    pub store: StoreConfig,

    /// Remote speech session settings (see `live` table in config.toml).
    #[serde(default)]
    pub live: LiveConfig,

    /// Admin panel gate (see `admin` table in config.toml).
    #[serde(default)]
    pub admin: AdminConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "NYLAH_";

impl Config {
    /// Builds a Figment that merges defaults, an optional config TOML file and
    /// `NYLAH_`-prefixed environment variables (`__` separates tables, e.g.
    /// `NYLAH_LIVE__API_KEY`).
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration without validating required fields.
    ///
    /// Binaries must call [`Config::validate`] before serving so the server
    /// never starts without a store URL or an admin password.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!(
                "failed to extract configuration from defaults + optional {} + {}* env: {err}",
                DEFAULT_CONFIG_FILE, ENV_PREFIX
            )
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.store.url.is_none() {
            return Err("store.url must be set".to_string());
        }
        if self.admin.password.trim().is_empty() {
            return Err("admin.password must be set and non-empty".to_string());
        }
        if self.admin.username.trim().is_empty() {
            return Err("admin.username must be set and non-empty".to_string());
        }
        Ok(())
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);
