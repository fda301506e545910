//! Kiosk configuration.
//!
//! Configuration is stored at `~/.config/checkin-kiosk/config.json`:
//!
//! ```json
//! {
//!   "backend": { "kind": "remote", "baseUrl": "https://kiosk.example.org/.netlify/functions" },
//!   "afterCheckIn": "resetToWelcome",
//!   "exportDir": "/home/kiosk/Downloads",
//!   "seedDefaults": true
//! }
//! ```
//!
//! Environment variables (also read from `.env`) override the file:
//! `CHECKIN_BACKEND`, `CHECKIN_API_URL`, `CHECKIN_DATA_DIR` and
//! `CHECKIN_AFTER_CHECKIN`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use kiosk_core::{AfterCheckIn, StoreBackend};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "checkin-kiosk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_BACKEND: &str = "CHECKIN_BACKEND";
pub const ENV_API_URL: &str = "CHECKIN_API_URL";
pub const ENV_DATA_DIR: &str = "CHECKIN_DATA_DIR";
pub const ENV_AFTER_CHECK_IN: &str = "CHECKIN_AFTER_CHECKIN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub backend: StoreBackend,
    pub after_check_in: AfterCheckIn,
    /// Where CSV exports are written. Falls back to the Downloads folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    /// Create the default groups when the store is empty.
    pub seed_defaults: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            after_check_in: AfterCheckIn::default(),
            export_dir: None,
            seed_defaults: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding `kiosk.log`.
    pub fn log_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Apply overrides from `lookup`, which returns the value of a variable
    /// if it is set.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let api_url = lookup(ENV_API_URL);
        let data_dir = lookup(ENV_DATA_DIR).map(PathBuf::from);

        if let Some(kind) = lookup(ENV_BACKEND) {
            self.backend = match kind.trim().to_lowercase().as_str() {
                "local" => StoreBackend::Local { data_dir: None },
                "remote" => {
                    let base_url = match (&api_url, &self.backend) {
                        (Some(url), _) => url.clone(),
                        (None, StoreBackend::Remote { base_url }) => base_url.clone(),
                        (None, StoreBackend::Local { .. }) => {
                            bail!("{}=remote requires {} to be set", ENV_BACKEND, ENV_API_URL)
                        }
                    };
                    StoreBackend::Remote { base_url }
                }
                other => bail!("{} must be 'local' or 'remote', got '{}'", ENV_BACKEND, other),
            };
        }

        match &mut self.backend {
            StoreBackend::Local { data_dir: dir } => {
                if data_dir.is_some() {
                    *dir = data_dir;
                }
            }
            StoreBackend::Remote { base_url } => {
                if let Some(url) = api_url {
                    *base_url = url;
                }
            }
        }

        if let Some(policy) = lookup(ENV_AFTER_CHECK_IN) {
            self.after_check_in = match policy.trim().to_lowercase().as_str() {
                "members" => AfterCheckIn::ReturnToMembers,
                "welcome" => AfterCheckIn::ResetToWelcome,
                other => bail!(
                    "{} must be 'members' or 'welcome', got '{}'",
                    ENV_AFTER_CHECK_IN,
                    other
                ),
            };
        }

        Ok(())
    }
}
