//! Implements StorePort using a JSON file.
//!
//! Holds persisted webhook registrations for locally run triggers.

use crate::domain::DomainError;
use crate::ports::StorePort;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

/// JSON file-based key-value store. Whole map is rewritten on each mutation.
pub struct JsonFileStore {
    path: PathBuf,
    cache: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load entries from disk. A missing file starts empty; a corrupt one is an error.
    pub async fn load(&self) -> Result<(), DomainError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s).map_err(|e| {
                DomainError::Store(format!("corrupt store file {}: {}", self.path.display(), e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(DomainError::Store(format!(
                    "read store file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        debug!(path = %self.path.display(), entries = data.len(), "store loaded");
        *self.cache.write().await = data;
        Ok(())
    }

    /// Write to a temp file, fsync, then rename over the target.
    async fn save(&self) -> Result<(), DomainError> {
        let json = {
            let data = self.cache.read().await;
            serde_json::to_string_pretty(&*data).map_err(|e| DomainError::Store(e.to_string()))?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Store(format!("create store dir: {}", e)))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Store(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::Store(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Store(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::Store(format!("atomic rename failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StorePort for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.cache.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.cache
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.save().await
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let removed = self.cache.write().await.remove(key).is_some();
        if removed {
            self.save().await?;
        }
        Ok(())
    }
}
