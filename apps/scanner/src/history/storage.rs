//! Durable storage backends for the history list.
//!
//! The whole history is one serialized blob under one fixed slot. `load`
//! returning `Ok(None)` means the slot was never written (or was deleted),
//! which is distinct from a persisted empty list.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

#[async_trait]
pub trait HistoryStorage: Send + Sync {
    async fn load(&self) -> Result<Option<String>>;
    async fn save(&self, payload: &str) -> Result<()>;
    /// Removes the slot entirely. Deleting an already-absent slot is fine.
    async fn delete(&self) -> Result<()>;
}

/// File-backed storage: one JSON file at a fixed path.
#[derive(Debug, Clone)]
pub struct FileHistoryStorage {
    path: PathBuf,
}

impl FileHistoryStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HistoryStorage for FileHistoryStorage {
    async fn load(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("failed to read history file {}", self.path.display())),
        }
    }

    async fn save(&self, payload: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("failed to create history directory {}", parent.display())
                })?;
            }
        }
        tokio::fs::write(&self.path, payload)
            .await
            .with_context(|| format!("failed to write history file {}", self.path.display()))
    }

    async fn delete(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("failed to delete history file {}", self.path.display())),
        }
    }
}

/// In-memory storage for tests. `set_fail_writes(true)` makes `save` and
/// `delete` fail, to exercise the persistence-failure path.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryHistoryStorage {
    blob: std::sync::Mutex<Option<String>>,
    fail_writes: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemoryHistoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn blob(&self) -> Option<String> {
        self.blob.lock().unwrap().clone()
    }

    pub fn set_blob(&self, payload: &str) {
        *self.blob.lock().unwrap() = Some(payload.to_string());
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("simulated storage write failure");
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl HistoryStorage for MemoryHistoryStorage {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.blob.lock().unwrap().clone())
    }

    async fn save(&self, payload: &str) -> Result<()> {
        self.check_writable()?;
        *self.blob.lock().unwrap() = Some(payload.to_string());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        self.check_writable()?;
        *self.blob.lock().unwrap() = None;
        Ok(())
    }
}
