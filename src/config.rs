//! Application configuration management.
//!
//! This module handles loading the application configuration: the backend
//! base URL, the list page size, and the detail freshness window.
//!
//! Configuration is stored at `~/.config/rostercache/config.json`. The
//! `STUDENT_API_URL` environment variable overrides the stored base URL.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::STUDENT_FRESH_SECS;

/// Application name used for config directory paths
const APP_NAME: &str = "rostercache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the backend base URL
const API_URL_ENV: &str = "STUDENT_API_URL";

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_student_fresh_secs() -> i64 {
    STUDENT_FRESH_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the student REST backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Students per list page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Seconds a fetched detail record stays fresh.
    #[serde(default = "default_student_fresh_secs")]
    pub student_fresh_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            student_fresh_secs: default_student_fresh_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::from_file(&path)?;
        // First run seeds the file with the defaults. The env override is
        // applied after so it never gets persisted.
        if !path.exists() {
            if let Err(error) = config.save() {
                warn!(error = %error, "Failed to write default config file");
            }
        }
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        // A zero page size would page nothing forever.
        if config.page_size == 0 {
            config.page_size = default_page_size();
        }
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

// ============================================================
// Tests
// ============================================================
