//! Weekly Notification State
//!
//! Which categories each member wants vacancy alerts for, and whether each day's
//! capacity has been confirmed this week. Both reset with the weekly cycle.

use crate::schedule::types::{Category, Day};

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Default)]
struct Inner {
    prefs: HashMap<String, BTreeSet<Category>>,
    confirmed: HashSet<Day>,
}

#[derive(Default)]
pub struct WeeklyState {
    inner: Mutex<Inner>,
}

impl WeeklyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `day` as confirmed. Returns `true` only for the first confirmation.
    pub fn confirm(&self, day: Day) -> bool {
        self.inner.lock().confirmed.insert(day)
    }

    pub fn is_confirmed(&self, day: Day) -> bool {
        self.inner.lock().confirmed.contains(&day)
    }

    pub fn set_pref(&self, subject_id: &str, category: Category, enabled: bool) {
        let mut inner = self.inner.lock();
        if enabled {
            inner
                .prefs
                .entry(subject_id.to_string())
                .or_default()
                .insert(category);
        } else if let Some(categories) = inner.prefs.get_mut(subject_id) {
            categories.remove(&category);
            if categories.is_empty() {
                inner.prefs.remove(subject_id);
            }
        }
    }

    /// Categories `subject_id` has enabled, in declaration order.
    pub fn prefs_for(&self, subject_id: &str) -> Vec<Category> {
        self.inner
            .lock()
            .prefs
            .get(subject_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Members who enabled alerts for `category`.
    pub fn subscribers_for(&self, category: Category) -> Vec<String> {
        let mut subjects: Vec<String> = self
            .inner
            .lock()
            .prefs
            .iter()
            .filter(|(_, categories)| categories.contains(&category))
            .map(|(subject, _)| subject.clone())
            .collect();
        subjects.sort();
        subjects
    }

    /// Clears preferences and confirmed flags.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.prefs.clear();
        inner.confirmed.clear();
        tracing::info!("Notification preferences cleared");
    }
}
