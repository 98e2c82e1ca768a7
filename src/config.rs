use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::params::{
    DEFAULT_DAYS_AFTER, DEFAULT_DAYS_BEFORE, DEFAULT_FREQUENCY, DEFAULT_MAX_COMMITS,
    IdentityOverride, MIN_COMMITS_PER_DAY, ParameterInput, default_commit_time,
};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub identity: Identity,
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub no_weekends: bool,
    pub min_commits: u8,
    pub max_commits: u8,
    pub frequency: u8,
    pub days_before: u32,
    pub days_after: u32,
    pub commit_time: NaiveTime,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            no_weekends: false,
            min_commits: MIN_COMMITS_PER_DAY,
            max_commits: DEFAULT_MAX_COMMITS,
            frequency: DEFAULT_FREQUENCY,
            days_before: DEFAULT_DAYS_BEFORE,
            days_after: DEFAULT_DAYS_AFTER,
            commit_time: default_commit_time(),
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("git-contrib");

        Ok(config_dir.join("config.toml"))
    }

    /// Reads `path`, writing a default file there first if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn identity_override(&self) -> IdentityOverride {
        IdentityOverride {
            name: self.identity.name.clone(),
            email: self.identity.email.clone(),
        }
    }

    /// Parameter input prefilled from the stored defaults.
    pub fn parameter_input(&self) -> ParameterInput {
        let d = &self.defaults;
        ParameterInput {
            no_weekends: d.no_weekends,
            min_commits: d.min_commits,
            max_commits: d.max_commits,
            frequency: d.frequency,
            identity: self.identity_override(),
            days_before: d.days_before,
            days_after: d.days_after,
            commit_time: d.commit_time,
            ..ParameterInput::default()
        }
    }
}
