use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_refresh_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Accounts file written by the web dashboard (users.json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts_file: Option<PathBuf>,

    /// Account shown by default (email)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Seconds between accounts file reloads
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    /// Show notifications when usage escalates
    #[serde(default)]
    pub notifications: bool,

    /// Color file in kitty.conf format (`color1 #rrggbb`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            accounts_file: None,
            account: None,
            refresh_secs: default_refresh_secs(),
            notifications: false,
            theme_file: None,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("quotabar");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Ok(Self::load_from(&path)),
            Err(_) => Ok(AppConfig::default()),
        }
    }

    /// Load config from `path`. The default config is only written when no
    /// file exists; a broken file is left for the user to fix.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let config = AppConfig::default();
            if let Err(e) = config.save_to(path) {
                tracing::warn!("Could not write default config: {}", e);
            }
            return config;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Failed to parse config, using defaults: {}", e),
            },
            Err(e) => tracing::warn!("Failed to read config, using defaults: {}", e),
        }

        AppConfig::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        let mut clean_config = self.clone();
        if clean_config.account.as_ref().map(|s| s.trim().is_empty()).unwrap_or(false) {
            clean_config.account = None;
        }

        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Configured accounts file, or `users.json` in the local data dir
    pub fn accounts_file(&self) -> PathBuf {
        self.accounts_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("quotabar")
                .join("users.json")
        })
    }
}

/// Command line settings that take precedence over the config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub accounts_file: Option<PathBuf>,
    pub account: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.accounts_file {
            config.accounts_file = Some(path.clone());
        }
        if let Some(account) = &self.account {
            config.account = Some(account.clone());
        }
    }
}

/// Config as loaded from disk with the command line overrides on top
pub fn effective_config(mut loaded: AppConfig, overrides: &Overrides) -> AppConfig {
    overrides.apply(&mut loaded);
    loaded
}
