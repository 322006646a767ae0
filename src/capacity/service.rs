//! Capacity Administration
//!
//! Applies manager-set capacities and announces the first confirmation of each day.

use super::store::{Capacities, CapacityCache};
use crate::notify::prefs::WeeklyState;
use crate::notify::types::PushPayload;
use crate::notify::vacancy::Notifier;
use crate::schedule::types::Day;

use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityUpdate {
    pub capacities: Capacities,
    /// Days confirmed for the first time by this update.
    pub newly_confirmed: Vec<Day>,
    /// Broadcast pushes queued for those days.
    pub broadcast: usize,
}

pub struct CapacityAdmin {
    cache: Arc<CapacityCache>,
    weekly: Arc<WeeklyState>,
    notifier: Arc<Notifier>,
}

impl CapacityAdmin {
    pub fn new(cache: Arc<CapacityCache>, weekly: Arc<WeeklyState>, notifier: Arc<Notifier>) -> Self {
        Self {
            cache,
            weekly,
            notifier,
        }
    }

    pub fn current(&self) -> Capacities {
        self.cache.snapshot()
    }

    /// Marks every day that already has a value as confirmed, without announcing it.
    /// Used once at startup after the cache is loaded from disk.
    pub fn adopt_loaded(&self) -> Vec<Day> {
        let days = self.cache.snapshot().days();
        for day in &days {
            self.weekly.confirm(*day);
        }
        days
    }

    pub async fn set(&self, changes: Capacities) -> CapacityUpdate {
        let capacities = self.cache.update(changes).await;

        let mut newly_confirmed = Vec::new();
        let mut broadcast = 0;
        for day in changes.days() {
            if !self.weekly.confirm(day) {
                continue;
            }

            let total = capacities.get(day).unwrap_or_default();
            broadcast += self
                .notifier
                .broadcast(&PushPayload::capacity_confirmed(day, total));
            tracing::info!("{} capacity confirmed at {}", day, total);
            newly_confirmed.push(day);
        }

        CapacityUpdate {
            capacities,
            newly_confirmed,
            broadcast,
        }
    }
}
