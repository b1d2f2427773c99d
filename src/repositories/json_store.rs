use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::errors::ServiceError;

/// Key/value store holding one JSON document per fixed key.
///
/// `key` maps to `<dir>/<key>.json`. Writes go to a synced temporary file in
/// the same directory, which is then renamed over the target.
#[derive(Clone, Debug)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Reads `key`, returning `None` when nothing has been stored yet.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ServiceError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ServiceError::StorageError(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            ServiceError::SerializationError(format!("malformed value under '{}': {}", key, e))
        })
    }

    pub async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), ServiceError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            ServiceError::StorageError(format!("failed to create {}: {}", self.dir.display(), e))
        })?;

        let dir = self.dir.clone();
        let path = self.path_for(key);
        let len = bytes.len();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &path, &bytes))
            .await
            .map_err(|e| ServiceError::InternalError(format!("persist task failed: {}", e)))??;

        debug!(key, bytes = len, "persisted value");
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), ServiceError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), ServiceError> {
    let storage_err = |action: &str, e: std::io::Error| {
        ServiceError::StorageError(format!("{} {}: {}", action, path.display(), e))
    };

    let temp = tempfile::Builder::new()
        .prefix(".o2d-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| storage_err("failed to create temp file for", e))?;

    let mut file = temp.as_file();
    file.write_all(bytes)
        .map_err(|e| storage_err("failed to write temp file for", e))?;
    file.sync_all()
        .map_err(|e| storage_err("failed to sync temp file for", e))?;

    temp.persist(path)
        .map_err(|e| storage_err("failed to replace", e.error))?;
    Ok(())
}
