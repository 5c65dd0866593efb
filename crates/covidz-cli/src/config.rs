//! Application configuration management.
//!
//! Configuration is stored at `~/.config/covidz/config.json`. Every field is
//! optional; environment variables (also read from a `.env` file) override
//! the file:
//!
//! - `COVIDZ_BASE_URL` - remote API root
//! - `COVIDZ_DATA_DIR` - where the cache and log live
//! - `COVIDZ_BACKOFF_SECS` - pause after a failed country during sync

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use covidz_core::api::client::DEFAULT_BASE_URL;
use covidz_core::sync::DEFAULT_BACKOFF_SECS;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "covidz";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Data directory under the home directory when none is configured
const DEFAULT_DATA_DIR: &str = ".covidzualizer";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub backoff_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Override fields from environment variables looked up through `var`.
    pub fn apply_env(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = var("COVIDZ_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(dir) = var("COVIDZ_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = var("COVIDZ_BACKOFF_SECS") {
            let secs = secs
                .trim()
                .parse()
                .with_context(|| format!("COVIDZ_BACKOFF_SECS is not a number: '{}'", secs))?;
            self.backoff_secs = Some(secs);
        }
        Ok(self)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(DEFAULT_DATA_DIR))
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs.unwrap_or(DEFAULT_BACKOFF_SECS))
    }
}
