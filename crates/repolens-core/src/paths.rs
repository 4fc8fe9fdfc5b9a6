use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("could not resolve home directory")]
    HomeDirectoryUnavailable,
}

/// Application data directory (`~/.repolens`), holding the history,
/// favorites, and cache stores.
pub fn data_dir() -> Result<PathBuf, PathError> {
    let base_dirs = BaseDirs::new().ok_or(PathError::HomeDirectoryUnavailable)?;
    Ok(base_dirs.home_dir().join(".repolens"))
}

pub fn config_path() -> Result<PathBuf, PathError> {
    let base_dirs = BaseDirs::new().ok_or(PathError::HomeDirectoryUnavailable)?;
    Ok(base_dirs
        .home_dir()
        .join(".config")
        .join("repolens")
        .join("config.toml"))
}
