use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Runtime settings; every key can be overridden with `DOOM_<KEY>`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data_path: PathBuf,
    pub curator_path: PathBuf,
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub throttle_ms: u64,
    pub error_pause_ms: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_config(
            Config::builder().add_source(Environment::with_prefix("DOOM").try_parsing(true)),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .set_default("data_path", "data/doom.json")?
            .set_default("curator_path", "curator.txt")?
            .set_default("api_url", "https://en.wikipedia.org/w/api.php")?
            .set_default(
                "user_agent",
                "DoomScroll/1.0 (https://github.com/innomen/DoomScroll; open source project)",
            )?
            .set_default("timeout_secs", 15)?
            .set_default("throttle_ms", 500)?
            .set_default("error_pause_ms", 1000)?
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn error_pause(&self) -> Duration {
        Duration::from_millis(self.error_pause_ms)
    }
}
