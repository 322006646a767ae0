//! Board Persistence Worker
//!
//! Periodically flushes the registration board to disk when it has unsaved changes.
//! The board is copied under the store lock; serialization and file I/O happen outside
//! it. Write failures are logged and retried on the next tick.

use super::memory::RegistrationStore;
use super::snapshot::SnapshotFile;
use super::types::{Board, Entry};
use crate::schedule::types::Category;

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// On-disk layout: category name to ordered entries.
type BoardDocument = BTreeMap<String, Vec<Entry>>;

pub struct PersistenceWorker {
    store: Arc<RegistrationStore>,
    file: Arc<SnapshotFile>,
    interval: Duration,
}

impl PersistenceWorker {
    pub fn new(store: Arc<RegistrationStore>, file: Arc<SnapshotFile>, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            store,
            file,
            interval,
        })
    }

    /// Rehydrates the board from the snapshot file. Returns the number of entries loaded.
    pub async fn restore(&self) -> usize {
        let Some(document) = self.file.load::<BoardDocument>().await else {
            tracing::info!("Starting with an empty board");
            return 0;
        };

        let loaded = self.store.restore(document_to_board(document));
        tracing::info!(
            "Restored {} entries from {}",
            loaded,
            self.file.path().display()
        );
        loaded
    }

    /// Writes the board if it is dirty. Returns whether a write happened.
    ///
    /// The dirty flag is only cleared when no mutation landed while the file was being
    /// written; otherwise the next tick writes again. Holds the file's exclusive guard
    /// from snapshot to rename so a concurrent weekly reset cannot be overwritten by a
    /// stale board.
    pub async fn flush(&self) -> Result<bool> {
        let _guard = self.file.exclusive().await;
        let Some((version, board)) = self.store.dirty_snapshot() else {
            return Ok(false);
        };

        self.file.store(&board_to_document(&board)).await?;

        if !self.store.mark_clean(version) {
            tracing::debug!("Board changed during flush; will write again next tick");
        }
        Ok(true)
    }

    /// Flushes on every tick until `cancel` fires, then performs one final flush.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!("Persistence worker started (every {:?})", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.flush().await {
                        Ok(true) => tracing::debug!("Board snapshot written"),
                        Ok(false) => {}
                        Err(e) => tracing::warn!("Board snapshot failed: {:#}", e),
                    }
                }
            }
        }

        if let Err(e) = self.flush().await {
            tracing::error!("Final board snapshot failed: {:#}", e);
        }
        tracing::info!("Persistence worker stopped");
    }
}

fn board_to_document(board: &Board) -> BoardDocument {
    board
        .iter()
        .map(|(category, entries)| (category.as_str().to_string(), entries.clone()))
        .collect()
}

fn document_to_board(document: BoardDocument) -> Board {
    document
        .into_iter()
        .filter_map(|(name, entries)| match name.parse::<Category>() {
            Ok(category) => Some((category, entries)),
            Err(e) => {
                tracing::warn!("Dropping snapshot section: {}", e);
                None
            }
        })
        .collect()
}
