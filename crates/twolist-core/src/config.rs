//! Configuration for twolist
//!
//! Stored in `<config dir>/twolist/config.toml`. Every field has a default, so
//! a missing file is the same as an empty one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "twolist";
const CONFIG_FILE: &str = "config.toml";

/// What to do when a stored blob cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Fail with a parse error
    Strict,
    /// Back up the bad blob, log a warning and start empty
    Recover,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LoadPolicy::Strict
        } else {
            LoadPolicy::Recover
        }
    }
}

impl std::fmt::Display for LoadPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadPolicy::Strict => write!(f, "strict"),
            LoadPolicy::Recover => write!(f, "recover"),
        }
    }
}

/// twolist configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Directory holding the stored lists (defaults to the platform data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Handling of unreadable stored data
    pub load_policy: LoadPolicy,

    /// Display settings
    pub display: DisplayConfig,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use colors in CLI output
    pub colors: bool,

    /// Date format for creation times
    pub date_format: String,

    /// Show open/done counts
    pub show_counts: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            date_format: "%Y-%m-%d %H:%M".to_string(),
            show_counts: true,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> crate::Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| crate::Error::Config("Could not determine config directory".into()))
    }

    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directory the lists are stored in
    pub fn data_dir(&self) -> crate::Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| crate::Error::Config("Could not determine data directory".into()))
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# twolist configuration

# Directory holding the stored lists (defaults to the platform data directory)
# data_dir = "/home/me/.local/share/twolist"

# What to do when stored data cannot be read:
#   "strict"  - refuse to start and report the error
#   "recover" - back up the unreadable data and start with empty lists
load_policy = "recover"

[display]
# Use colors in CLI output
colors = true

# Date format for creation times (strftime format)
date_format = "%Y-%m-%d %H:%M"

# Show open/done counts
show_counts = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert!(config.data_dir.is_none());
        assert_eq!(config.load_policy, LoadPolicy::default());
        assert!(config.display.colors);
    }

    #[test]
    fn test_commented_template_parses() {
        let config: Config = toml::from_str(&Config::default_with_comments()).unwrap();
        assert_eq!(config.load_policy, LoadPolicy::Recover);
        assert_eq!(config.display.date_format, "%Y-%m-%d %H:%M");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = Config::default();
        config.data_dir = Some(dir.path().join("data"));
        config.load_policy = LoadPolicy::Strict;
        config.display.show_counts = false;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.data_dir, Some(dir.path().join("data")));
        assert_eq!(loaded.load_policy, LoadPolicy::Strict);
        assert!(!loaded.display.show_counts);
        assert_eq!(loaded.data_dir().unwrap(), dir.path().join("data"));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "load_policy = 7").unwrap();
        assert!(matches!(Config::load(&path), Err(crate::Error::Config(_))));
    }
}
