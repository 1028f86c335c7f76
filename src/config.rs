//! Configuration loading and management
//!
//! Handles parsing of `.tickler.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::company::Company;
use crate::error::{Error, Result};

/// Config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".tickler.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Task list location
    #[serde(default)]
    pub store: StoreConfig,

    /// Occurrence scanning and tagging
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Submission lead-time rules
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Static company directory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Task file, relative to the directory holding the config
    #[serde(default = "default_store_file")]
    pub file: PathBuf,

    /// How long a save waits for another process's lock, in milliseconds
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_store_file() -> PathBuf {
    PathBuf::from("tasks.json")
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file: default_store_file(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minimum days scanned on each side of a window
    #[serde(default = "default_buffer_days")]
    pub buffer_days: i64,

    /// Horizon for the "due soon" tag
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,
}

fn default_buffer_days() -> i64 {
    crate::schedule::DEFAULT_BUFFER_DAYS
}

fn default_due_soon_days() -> i64 {
    7
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            buffer_days: default_buffer_days(),
            due_soon_days: default_due_soon_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Lead-day floor for mail and direct deposit
    #[serde(default = "default_min_lead_days")]
    pub min_lead_days: u32,
}

fn default_min_lead_days() -> u32 {
    crate::task::DEFAULT_MIN_LEAD_DAYS
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            min_lead_days: default_min_lead_days(),
        }
    }
}

impl Config {
    /// Load configuration from a `.tickler.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `dir`, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Task file path, resolved against the config's directory.
    pub fn store_path(&self, base_dir: &Path) -> PathBuf {
        if self.store.file.is_absolute() {
            self.store.file.clone()
        } else {
            base_dir.join(&self.store.file)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.store.file.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("store.file cannot be empty".to_string()));
        }
        if self.schedule.buffer_days < 1 {
            return Err(Error::InvalidConfig(format!(
                "schedule.buffer_days must be at least 1 (got {})",
                self.schedule.buffer_days
            )));
        }
        if self.schedule.due_soon_days < 0 {
            return Err(Error::InvalidConfig(format!(
                "schedule.due_soon_days cannot be negative (got {})",
                self.schedule.due_soon_days
            )));
        }
        if self.submission.min_lead_days < 1 {
            return Err(Error::InvalidConfig(
                "submission.min_lead_days must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for company in &self.companies {
            if company.name.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "companies: entry {} has an empty name",
                    company.index
                )));
            }
            if !seen.insert(company.index) {
                return Err(Error::InvalidConfig(format!(
                    "companies: duplicate index {}",
                    company.index
                )));
            }
        }
        Ok(())
    }
}
