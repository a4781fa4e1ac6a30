use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::firebase::database::validate_path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_credentials_path")]
    pub firebase_credentials_path: String,
    #[serde(default = "default_database_url")]
    pub firebase_database_url: String,
    #[serde(default = "default_bus_ref_path")]
    pub bus_ref_path: String,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// JSON file with `[lat, lon]` pairs; the built-in campus loop is used when unset.
    #[serde(default)]
    pub route_file: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_credentials_path() -> String {
    "sstu-101-firebase-adminsdk-fbsvc-301388847d.json".to_string()
}

fn default_database_url() -> String {
    "https://sstu-101-default-rtdb.asia-southeast1.firebasedatabase.app".to_string()
}

fn default_bus_ref_path() -> String {
    "buses/bus1".to_string()
}

fn default_tick_interval_secs() -> u64 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Parses configuration from explicit `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config =
            envy::from_iter(vars).context("Failed to load config from environment")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_secs == 0 {
            bail!("TICK_INTERVAL_SECS must be greater than zero");
        }
        validate_path(&self.bus_ref_path).context("Invalid BUS_REF_PATH")?;
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}
