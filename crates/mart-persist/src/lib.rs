//! JSON file-backed persistence for stablemart state.
//!
//! Every durable table (order ledger, asset registry, coin balances) is kept
//! in memory and snapshotted as a whole to `<state_dir>/<name>.json` after each
//! mutation. Writes go to a sibling temp file first and are renamed into
//! place, so a crash mid-write leaves the previous snapshot intact.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem access failed.
    #[error("snapshot io error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Snapshot contents could not be encoded or decoded.
    #[error("snapshot format error on {path}: {source}")]
    Format {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// A single named JSON snapshot file inside a state directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Create a store for `<state_path>/<name>.json`.
    ///
    /// Nothing is touched on disk until the first [`save`](Self::save).
    pub fn new(state_path: &Path, name: &str) -> Self {
        Self {
            path: state_path.join(format!("{name}.json")),
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, distinguishing "no snapshot yet" (`Ok(None)`) from a
    /// snapshot that exists but cannot be read.
    pub fn try_load<T>(&self) -> Result<Option<T>, PersistError>
    where
        T: DeserializeOwned,
    {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let value = serde_json::from_slice(&bytes).map_err(|source| PersistError::Format {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "loaded snapshot");
        Ok(Some(value))
    }

    /// Write a full snapshot, replacing the previous one atomically.
    pub fn save<T>(&self, value: &T) -> Result<(), PersistError>
    where
        T: Serialize + ?Sized,
    {
        let io_err = |source| PersistError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(value).map_err(|source| PersistError::Format {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}
