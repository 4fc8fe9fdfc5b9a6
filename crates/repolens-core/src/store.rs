//! Shared load/save plumbing for the flat JSON stores (history, favorites,
//! cache entries). Whole-file read and atomic rewrite; no partial writes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize store: {0}")]
    Serialize(serde_json::Error),
}

/// Loads a JSON store, returning `T::default()` when the file is absent.
pub fn load_json_or_default<T>(path: &Path) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }

    let raw = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serializes the whole structure and replaces the file via temp + rename.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let serialized = serde_json::to_string_pretty(value).map_err(StoreError::Serialize)?;
    let temp_path = path.with_extension("json.tmp");

    fs::write(&temp_path, serialized).map_err(|source| StoreError::Write {
        path: temp_path.clone(),
        source,
    })?;

    fs::rename(&temp_path, path).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
