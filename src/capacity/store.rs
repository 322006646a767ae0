//! Write-Through Capacity Cache
//!
//! Per-day seat totals set by a manager. Reads are served from memory; every change is
//! written straight to `capacity.json` so a restart keeps the week's confirmed values.

use crate::schedule::types::Day;
use crate::storage::snapshot::SnapshotFile;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Capacity per day; `None` means not yet set this week.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capacities {
    #[serde(default)]
    pub wed: Option<u32>,
    #[serde(default)]
    pub fri: Option<u32>,
}

impl Capacities {
    pub fn get(&self, day: Day) -> Option<u32> {
        match day {
            Day::Wed => self.wed,
            Day::Fri => self.fri,
        }
    }

    pub fn set(&mut self, day: Day, value: Option<u32>) {
        match day {
            Day::Wed => self.wed = value,
            Day::Fri => self.fri = value,
        }
    }

    /// Days that carry a value.
    pub fn days(&self) -> Vec<Day> {
        Day::ALL
            .into_iter()
            .filter(|day| self.get(*day).is_some())
            .collect()
    }
}

pub struct CapacityCache {
    values: Mutex<Capacities>,
    file: SnapshotFile,
    /// Serializes file writes so the on-disk copy never goes backwards.
    write_lock: tokio::sync::Mutex<()>,
}

impl CapacityCache {
    /// Loads the cache from `file`; a missing or unreadable file yields no capacities.
    pub async fn load(file: SnapshotFile) -> Self {
        let values = file.load::<Capacities>().await.unwrap_or_default();
        if !values.days().is_empty() {
            tracing::info!(
                "Loaded capacities wed={:?} fri={:?}",
                values.wed,
                values.fri
            );
        }

        Self {
            values: Mutex::new(values),
            file,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn get(&self, day: Day) -> Option<u32> {
        self.values.lock().get(day)
    }

    pub fn snapshot(&self) -> Capacities {
        *self.values.lock()
    }

    /// Applies every day present in `changes` and writes the result through.
    ///
    /// A failed write is logged; the in-memory value stays authoritative and the next
    /// change rewrites the file.
    pub async fn update(&self, changes: Capacities) -> Capacities {
        let _guard = self.write_lock.lock().await;

        let updated = {
            let mut values = self.values.lock();
            for day in changes.days() {
                values.set(day, changes.get(day));
            }
            *values
        };

        self.persist(&updated).await;
        updated
    }

    /// Clears both days and rewrites the file.
    pub async fn reset(&self) {
        let _guard = self.write_lock.lock().await;

        *self.values.lock() = Capacities::default();
        self.persist(&Capacities::default()).await;
        tracing::info!("Capacities cleared");
    }

    async fn persist(&self, values: &Capacities) {
        if let Err(e) = self.file.store(values).await {
            tracing::warn!("Failed to write capacities: {:#}", e);
        }
    }
}
