//! Service configuration
//!
//! Defaults, then an optional `site-scout.toml`, then `SITE_SCOUT__*`
//! environment variables (e.g. `SITE_SCOUT__POWER__TIMEOUT_SECS=10`).

use std::time::Duration;

use serde::Deserialize;

use crate::constants::{GEOCODING_API_BASE, POWER_API_BASE, POWER_COMMUNITY};
use crate::error::ConfigError;

const CONFIG_FILE: &str = "site-scout";
const ENV_PREFIX: &str = "SITE_SCOUT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub power: PowerConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
}

/// NASA POWER client settings
#[derive(Debug, Clone, Deserialize)]
pub struct PowerConfig {
    /// Daily point endpoint
    #[serde(default = "default_power_base_url")]
    pub base_url: String,

    /// POWER community code sent with every request
    #[serde(default = "default_community")]
    pub community: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_power_timeout")]
    pub timeout_secs: u64,

    /// Drop every fill value from the statistics instead of only
    /// checking the first observation
    #[serde(default)]
    pub strict_sentinels: bool,
}

/// Geocoding client settings
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_secs: u64,
}

fn default_power_base_url() -> String {
    POWER_API_BASE.to_string()
}

fn default_community() -> String {
    POWER_COMMUNITY.to_string()
}

const fn default_power_timeout() -> u64 {
    30
}

fn default_geocoding_base_url() -> String {
    GEOCODING_API_BASE.to_string()
}

const fn default_geocoding_timeout() -> u64 {
    10
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            base_url: default_power_base_url(),
            community: default_community(),
            timeout_secs: default_power_timeout(),
            strict_sentinels: false,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            timeout_secs: default_geocoding_timeout(),
        }
    }
}

impl PowerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ScoutConfig {
    /// Load configuration from the optional config file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with(env: config::Environment) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(env)
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
