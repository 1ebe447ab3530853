//! Toolshed configuration (config.yaml)
//!
//! Lists the manifest directories that form the built-in set and the
//! directories that seed the installer store, plus the page size the
//! registry uses when it enumerates the store.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::registry::DEFAULT_PAGE_SIZE;

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.yaml";

/// Toolshed configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolshedConfig {
    /// Directories whose manifests form the built-in set
    #[serde(default)]
    pub builtin_dirs: Vec<PathBuf>,

    /// Directories whose manifests seed the installer store
    #[serde(default)]
    pub store_dirs: Vec<PathBuf>,

    /// Page size for store enumeration
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ToolshedConfig {
    fn default() -> Self {
        Self {
            builtin_dirs: Vec::new(),
            store_dirs: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ToolshedConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_config_path()?)
    }

    /// Load configuration from a specific path; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Self = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self).context("Failed to serialize config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::default_config_path()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            anyhow::bail!("pageSize must be greater than zero");
        }
        Ok(())
    }

    /// Default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Platform config directory for toolshed
    pub fn config_dir() -> Result<PathBuf> {
        directories::ProjectDirs::from("dev", "toolshed", "toolshed")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("toolshed")))
            .context("Could not determine config directory")
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ToolshedConfig::load_from_path(&temp_dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, ToolshedConfig::default());
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_parse_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "builtinDirs:\n  - /opt/installers\n").unwrap();

        let config = ToolshedConfig::load_from_path(&path).unwrap();
        assert_eq!(config.builtin_dirs, vec![PathBuf::from("/opt/installers")]);
        assert!(config.store_dirs.is_empty());
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "pageSize: 0\n").unwrap();

        let err = ToolshedConfig::load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("pageSize"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let config = ToolshedConfig {
            builtin_dirs: vec![PathBuf::from("builtins")],
            store_dirs: vec![PathBuf::from("store")],
            page_size: 25,
        };
        config.save_to_path(&path).unwrap();

        let loaded = ToolshedConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
