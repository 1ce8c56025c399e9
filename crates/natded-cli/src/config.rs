//! Configuration file support for the natded CLI
//!
//! Supports loading configuration from .natdedrc files in:
//! - Custom path via environment variable
//! - Current directory
//! - User home directory

use anyhow::{Context, Result};
use natded_core::{Locale, Notation, RuleFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file.
pub const CONFIG_FILE: &str = ".natdedrc";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "NATDED_CONFIG";

/// Configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keyword language for formula input
    pub locale: Locale,

    /// Connective symbols used when printing
    pub notation: Notation,

    /// Enable colored output
    pub colored: bool,

    /// Rules offered by the catalog
    pub rules: RuleFilter,

    /// REPL settings
    pub repl: ReplConfig,

    /// Session persistence settings
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// REPL prompt string
    pub prompt: String,

    /// History file path (relative to home)
    pub history_file: String,

    /// Maximum history entries
    pub max_history: usize,

    /// Auto-save history
    pub auto_save: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Save the workspace after every change
    pub autosave: bool,

    /// Storage key used by autosave and by `save`/`load` without a file
    pub key: String,

    /// Directory for stored sessions (None = platform data directory)
    pub data_dir: Option<PathBuf>,

    /// Maximum number of undo steps
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            notation: Notation::Unicode,
            colored: true,
            rules: RuleFilter::default(),
            repl: ReplConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "natded> ".to_string(),
            history_file: ".natded_history".to_string(),
            max_history: 1000,
            auto_save: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave: false,
            key: "session".to_string(),
            data_dir: None,
            history_limit: natded_core::DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Find and load configuration file
    ///
    /// Search order:
    /// 1. NATDED_CONFIG environment variable
    /// 2. .natdedrc in current directory
    /// 3. .natdedrc in user home directory
    ///
    /// A file that exists but does not parse is reported as an error rather
    /// than silently replaced by defaults.
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// The first configuration file that exists, in search order.
    pub fn find() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let current = PathBuf::from(CONFIG_FILE);
        if current.exists() {
            return Some(current);
        }

        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE))
            .filter(|path| path.exists())
    }

    /// Get configuration file path (explicit, current or home)
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }

        let current = PathBuf::from(CONFIG_FILE);
        if current.exists() {
            return current;
        }

        match dirs::home_dir() {
            Some(home) => home.join(CONFIG_FILE),
            None => current,
        }
    }

    /// Create a default configuration file
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }
        Self::default().save(&path)?;
        Ok(path)
    }
}
