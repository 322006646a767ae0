//! Weekly Reset Scheduler
//!
//! A single long-lived loop that sleeps until the next cycle boundary and then wipes the
//! week's state: the registration board (and its snapshot file), the capacity cache and
//! the notification preferences, in that order.

use super::clock::Clock;
use super::window::WeekCycle;
use crate::capacity::store::CapacityCache;
use crate::notify::prefs::WeeklyState;
use crate::storage::memory::RegistrationStore;
use crate::storage::snapshot::SnapshotFile;

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct WeeklyResetScheduler {
    cycle: WeekCycle,
    clock: Arc<dyn Clock>,
    store: Arc<RegistrationStore>,
    board_file: Arc<SnapshotFile>,
    capacities: Arc<CapacityCache>,
    weekly: Arc<WeeklyState>,
}

impl WeeklyResetScheduler {
    pub fn new(
        cycle: WeekCycle,
        clock: Arc<dyn Clock>,
        store: Arc<RegistrationStore>,
        board_file: Arc<SnapshotFile>,
        capacities: Arc<CapacityCache>,
        weekly: Arc<WeeklyState>,
    ) -> Arc<Self> {
        Arc::new(Self {
            cycle,
            clock,
            store,
            board_file,
            capacities,
            weekly,
        })
    }

    /// Runs until `cancel` fires. Each iteration recomputes the boundary from the
    /// current time, so waking late never produces a second reset for the same week.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut last_fired: Option<DateTime<FixedOffset>> = None;

        loop {
            let now = self.clock.now();
            let next = next_reset_after(&self.cycle, &now, last_fired.as_ref());
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tracing::info!("Next weekly reset at {} (in {}s)", next, wait.as_secs());

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            self.reset_now().await;
            last_fired = Some(next);
        }

        tracing::info!("Weekly reset scheduler stopped");
    }

    /// Clears the board, the capacity cache and the notification state.
    pub async fn reset_now(&self) {
        {
            let _guard = self.board_file.exclusive().await;
            self.store.reset_all();
            if let Err(e) = self.board_file.discard().await {
                tracing::warn!("Failed to remove board snapshot during reset: {}", e);
            }
        }

        self.capacities.reset().await;
        self.weekly.reset();

        tracing::info!("Weekly reset completed");
    }
}

/// Next boundary to fire at. A boundary that already fired is never returned again,
/// even if the clock reads slightly before it.
pub fn next_reset_after(
    cycle: &WeekCycle,
    now: &DateTime<FixedOffset>,
    last_fired: Option<&DateTime<FixedOffset>>,
) -> DateTime<FixedOffset> {
    let reference = match last_fired {
        Some(fired) if fired > now => fired,
        _ => now,
    };
    cycle.next_cycle_start(reference)
}
