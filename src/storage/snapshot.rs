//! Atomic JSON Snapshot Files
//!
//! Every durable document (board backup, capacities, push subscriptions) is written the
//! same way: serialize, write to a sibling temp file, fsync, rename over the target.
//! A reader therefore sees either the previous or the new document, never a torn one.

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
    exclusive: Mutex<()>,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exclusive: Mutex::new(()),
        }
    }

    /// Guard for multi-step sequences that must not interleave with each other on this
    /// file, such as snapshot-then-write against clear-then-delete.
    pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.exclusive.lock().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the document.
    ///
    /// A missing file and an undecodable file both yield `None`; the caller starts
    /// from an empty state in either case.
    pub async fn load<T: DeserializeOwned>(&self) -> Option<T> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No snapshot at {}", self.path.display());
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read snapshot {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt snapshot {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Serializes `value` and atomically replaces the file with it.
    pub async fn store<T: Serialize>(&self, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value).context("serialize snapshot")?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create directory {}", parent.display()))?;
        }

        let tmp = self.temp_path();
        let write = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp, &self.path).await
        };

        if let Err(e) = write.await {
            // Best effort: a leftover temp file is harmless but untidy
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("write snapshot {}", self.path.display()));
        }

        Ok(())
    }

    /// Removes the file. Succeeds if it was already absent.
    pub async fn discard(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove snapshot {}", self.path.display())),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
    }
}
