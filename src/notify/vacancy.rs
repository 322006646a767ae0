//! Vacancy Detection and Fan-Out
//!
//! After a release, decides whether a confirmed seat was freed and, if so, queues a
//! push for every subscription of every member watching that category.

use super::prefs::WeeklyState;
use super::queue::PushQueue;
use super::subscriptions::SubscriptionStore;
use super::types::{PushJob, PushPayload};
use crate::capacity::formula::{CapacityTable, is_vacancy};
use crate::capacity::store::CapacityCache;
use crate::schedule::types::Category;
use crate::storage::memory::RegistrationStore;

use serde::Serialize;
use std::sync::Arc;

/// Queues pushes for category watchers or for everyone.
pub struct Notifier {
    subscriptions: Arc<dyn SubscriptionStore>,
    weekly: Arc<WeeklyState>,
    queue: Arc<PushQueue>,
}

impl Notifier {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        weekly: Arc<WeeklyState>,
        queue: Arc<PushQueue>,
    ) -> Self {
        Self {
            subscriptions,
            weekly,
            queue,
        }
    }

    /// Queues `payload` for members who enabled alerts for `category`.
    /// Returns the number of jobs accepted by the queue.
    pub fn notify_category(&self, category: Category, payload: &PushPayload) -> usize {
        let mut queued = 0;
        for subject in self.weekly.subscribers_for(category) {
            for subscription in self.subscriptions.by_subject(&subject) {
                if self.queue.enqueue(PushJob {
                    subscription,
                    payload: payload.clone(),
                }) {
                    queued += 1;
                }
            }
        }
        queued
    }

    /// Queues `payload` for every known subscription.
    pub fn broadcast(&self, payload: &PushPayload) -> usize {
        self.subscriptions
            .all()
            .into_iter()
            .filter(|subscription| {
                self.queue.enqueue(PushJob {
                    subscription: subscription.clone(),
                    payload: payload.clone(),
                })
            })
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum VacancyDecision {
    /// The category never produces vacancy alerts.
    NotTracked,
    /// The day's capacity has not been confirmed this week.
    Unconfirmed,
    /// The released entry was on the waiting list.
    Waitlisted { capacity: u32 },
    /// A confirmed seat was freed; `notified` jobs were queued.
    Vacancy { capacity: u32, notified: usize },
}

pub struct VacancyDetector {
    table: CapacityTable,
    capacities: Arc<CapacityCache>,
    weekly: Arc<WeeklyState>,
    store: Arc<RegistrationStore>,
    notifier: Arc<Notifier>,
}

impl VacancyDetector {
    pub fn new(
        table: CapacityTable,
        capacities: Arc<CapacityCache>,
        weekly: Arc<WeeklyState>,
        store: Arc<RegistrationStore>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            table,
            capacities,
            weekly,
            store,
            notifier,
        }
    }

    /// Evaluates a release that removed the entry at `position` (pre-release index).
    pub fn on_release(&self, category: Category, position: usize) -> VacancyDecision {
        if !category.is_capacity_tracked() {
            return VacancyDecision::NotTracked;
        }

        let day = category.day();
        let total = match self.capacities.get(day) {
            Some(total) if self.weekly.is_confirmed(day) => total,
            _ => return VacancyDecision::Unconfirmed,
        };

        let board = self.store.snapshot_all();
        let Some(capacity) = self.table.effective_capacity(category, total, &board) else {
            return VacancyDecision::NotTracked;
        };

        if !is_vacancy(position, capacity) {
            tracing::debug!(
                "Release at #{} in {} is past the cutoff {}",
                position,
                category,
                capacity
            );
            return VacancyDecision::Waitlisted { capacity };
        }

        let notified = self
            .notifier
            .notify_category(category, &PushPayload::vacancy(category));
        tracing::info!(
            "Vacancy in {} (position {} < {}); queued {} pushes",
            category,
            position,
            capacity,
            notified
        );

        VacancyDecision::Vacancy { capacity, notified }
    }
}
