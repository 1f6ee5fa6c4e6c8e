use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{AlacenaError, AlacenaResult};

/// Storage key of the access token
pub const ACCESS_KEY: &str = "access";
/// Storage key of the refresh token
pub const REFRESH_KEY: &str = "refresh";

/// Persistent key-value storage holding the credentials
///
/// Implementations only need to make a single `set` or `delete` atomic;
/// nothing here is transactional across keys.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> AlacenaResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> AlacenaResult<()>;

    async fn delete(&self, key: &str) -> AlacenaResult<()>;
}

/// In-memory credential store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> AlacenaResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AlacenaResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AlacenaResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// Credential store backed by a single JSON file
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self, key: &str) -> AlacenaResult<HashMap<String, String>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                AlacenaError::storage(key, format!("corrupt store {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(AlacenaError::storage(key, e)),
        }
    }

    async fn save(&self, key: &str, values: &HashMap<String, String>) -> AlacenaResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AlacenaError::storage(key, e))?;
            }
        }

        let contents =
            serde_json::to_string_pretty(values).map_err(|e| AlacenaError::storage(key, e))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)
            .await
            .map_err(|e| AlacenaError::storage(key, e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| AlacenaError::storage(key, e))?;

        debug!(path = %self.path.display(), "Credential store saved");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn get(&self, key: &str) -> AlacenaResult<Option<String>> {
        Ok(self.load(key).await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> AlacenaResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load(key).await?;
        values.insert(key.to_string(), value.to_string());
        self.save(key, &values).await?;
        info!(key = %key, "Credential stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> AlacenaResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load(key).await?;
        if values.remove(key).is_none() {
            debug!(key = %key, "No credential to remove");
            return Ok(());
        }
        self.save(key, &values).await?;
        info!(key = %key, "Credential removed");
        Ok(())
    }
}
