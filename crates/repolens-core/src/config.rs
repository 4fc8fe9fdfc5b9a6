use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::DEFAULT_TTL_HOURS;

const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    Dark,
    Light,
    HighContrast,
}

impl Default for ThemeName {
    fn default() -> Self {
        Self::Dark
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepolensConfig {
    pub version: u32,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: ThemeName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_ttl_hours() -> u64 {
    DEFAULT_TTL_HOURS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: DEFAULT_TTL_HOURS,
        }
    }
}

impl Default for RepolensConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ui: UiConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

/// Loads the config, falling back to defaults when the file is absent.
pub fn load_config(path: &Path) -> Result<RepolensConfig, ConfigError> {
    if !path.exists() {
        return Ok(RepolensConfig::default());
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: RepolensConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

pub fn validate_config(config: &RepolensConfig) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("version must be {CONFIG_VERSION}"),
        });
    }

    if config.cache.ttl_hours == 0 {
        return Err(ConfigError::Validation {
            message: "cache ttl_hours must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = load_config(&temp.path().join("config.toml")).expect("load");
        assert_eq!(config, RepolensConfig::default());
        assert_eq!(config.ui.theme, ThemeName::Dark);
        assert!(config.cache.enabled);
    }

    #[test]
    fn parses_partial_config_with_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "version = 1\n\n[ui]\ntheme = \"high-contrast\"\n").expect("write");

        let config = load_config(&path).expect("load");
        assert_eq!(config.ui.theme, ThemeName::HighContrast);
        assert_eq!(config.cache.ttl_hours, DEFAULT_TTL_HOURS);
    }

    #[test]
    fn rejects_unsupported_version() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "version = 2\n").expect("write");

        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn rejects_zero_ttl() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "version = 1\n\n[cache]\nttl_hours = 0\n").expect("write");

        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation { .. })
        ));
    }
}
