use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{Error, Result};
use crate::storage::traits::KeyValueStore;

/// One JSON file per key under a directory.
///
/// Writes go to `<key>.tmp` first and are renamed over `<key>.json`, so a
/// reader sees either the old value or the new one, never a partial file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                Error::Persistence(format!(
                    "Failed to create cache directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Remove leftover temporary files from interrupted writes.
    pub async fn cleanup(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let is_tmp = entry
                .file_name()
                .to_str()
                .map(|name| name.ends_with(".tmp"))
                .unwrap_or(false);
            if is_tmp && fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;

        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Cache file does not exist: {}", path.display());
                Ok(None)
            }
            Err(e) => Err(Error::Persistence(format!(
                "Failed to read cache file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let temp_file = path.with_extension("tmp");

        fs::write(&temp_file, value).await.map_err(|e| {
            Error::Persistence(format!(
                "Failed to write cache to '{}': {}",
                temp_file.display(),
                e
            ))
        })?;

        fs::rename(&temp_file, &path).await.map_err(|e| {
            Error::Persistence(format!(
                "Failed to rename cache file '{}' to '{}': {}",
                temp_file.display(),
                path.display(),
                e
            ))
        })?;

        tracing::debug!("Saved {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Persistence(format!(
                "Failed to remove cache file '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key == "."
        || key.contains("..")
        || key.contains('/')
        || key.contains('\\')
        || key.chars().any(char::is_control);

    if bad {
        return Err(Error::Invalid(format!("Unusable storage key: {:?}", key)));
    }
    Ok(())
}
