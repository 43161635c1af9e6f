//! One JSON document on disk, cached in memory, flushed on every mutation.
//!
//! Mutations run under the document's write lock against a copy of the data; the copy is
//! written to `<path>.tmp` and renamed over the target before it replaces the cached value.
//! A failed flush therefore leaves memory and disk in agreement.

use crate::error::PersistenceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct JsonDocument<T> {
    path: PathBuf,
    data: RwLock<T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send + Sync,
{
    /// Open `path`, creating the file (and parent directories) with `T::default()` when missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
                let data = T::default();
                write_atomic(&path, &data).await?;
                data
            }
            Ok(bytes) => decode(&path, &bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let data = T::default();
                write_atomic(&path, &data).await?;
                tracing::info!(path = %path.display(), "created document");
                data
            }
            Err(e) => return Err(io_error(&path, e)),
        };
        Ok(JsonDocument {
            path,
            data: RwLock::new(data),
        })
    }

    pub async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.data.read().await;
        f(&guard)
    }

    /// Read-modify-write. The closure may reject the change; nothing is written then.
    pub async fn update<R, E>(&self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E>
    where
        E: From<PersistenceError>,
    {
        let mut guard = self.data.write().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        write_atomic(&self.path, &next).await?;
        *guard = next;
        Ok(out)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn decode<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, PersistenceError> {
    serde_json::from_slice(bytes).map_err(|source| PersistenceError::Malformed {
        path: path.display().to_string(),
        source,
    })
}

async fn write_atomic<T: Serialize>(path: &Path, data: &T) -> Result<(), PersistenceError> {
    let bytes = serde_json::to_vec_pretty(data)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| io_error(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, &bytes).await.map_err(|e| io_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| io_error(path, e))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "flushed document");
    Ok(())
}
