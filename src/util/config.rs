//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.unify/config.toml` - user-wide defaults
//! - Project: `.unify/config.toml` - project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::toolchain::multiplatform::DEFAULT_NATIVE_PRESET;

/// Linker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Toolchain settings
    pub toolchain: ToolchainSettings,
}

/// Settings handed to the toolchain plugin and the finalize bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Preset used for native compile targets (e.g. macosArm64, linuxX64)
    pub native_preset: Option<String>,

    /// Language version used when the model leaves it unset (e.g. "2.0")
    pub language_version: Option<String>,
}

impl ToolchainSettings {
    /// Configured native preset, or the toolchain default.
    pub fn native_preset(&self) -> &str {
        self.native_preset.as_deref().unwrap_or(DEFAULT_NATIVE_PRESET)
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config file: {}", path.display()))
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.toolchain.native_preset.is_some() {
            self.toolchain.native_preset = other.toolchain.native_preset;
        }
        if other.toolchain.language_version.is_some() {
            self.toolchain.language_version = other.toolchain.language_version;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.unify/config.toml)
/// 2. Global config (~/.unify/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global config directory (~/.unify).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".unify"))
}

/// Get the global config path (~/.unify/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.unify/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".unify").join("config.toml")
}
