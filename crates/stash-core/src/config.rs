//! Configuration module

use crate::{Error, Result};
use dirs::{config_dir, data_dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure
///
/// The archive names and the global root are plain config values rather than
/// constants so that tests (and unusual setups) can point a [`crate::Stash`]
/// at throwaway locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the expanded archive directory, relative to the working directory
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
    /// Name of the compressed archive file, relative to the working directory
    #[serde(default = "default_compressed_file")]
    pub compressed_file: PathBuf,
    /// Absolute root of the global archive mirror
    #[serde(default = "default_global_root")]
    pub global_root: PathBuf,
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("archive")
}

fn default_compressed_file() -> PathBuf {
    PathBuf::from(".archive.tar.gz")
}

fn default_global_root() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("stash")
        .join("global")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
            compressed_file: default_compressed_file(),
            global_root: default_global_root(),
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;

        let stash_dir = config_dir.join("stash");
        if !stash_dir.exists() {
            fs::create_dir_all(&stash_dir)?;
        }

        Ok(stash_dir.join("config.toml"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&path, contents)?;
        Ok(())
    }

    /// Load configuration or use defaults if loading fails
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.archive_dir, PathBuf::from("archive"));
        assert_eq!(config.compressed_file, PathBuf::from(".archive.tar.gz"));
        assert!(config.global_root.is_absolute());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.archive_dir, deserialized.archive_dir);
        assert_eq!(config.compressed_file, deserialized.compressed_file);
        assert_eq!(config.global_root, deserialized.global_root);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(r#"global_root = "/srv/stash""#).unwrap();
        assert_eq!(config.global_root, PathBuf::from("/srv/stash"));
        assert_eq!(config.archive_dir, PathBuf::from("archive"));
        assert_eq!(config.compressed_file, PathBuf::from(".archive.tar.gz"));
    }
}
