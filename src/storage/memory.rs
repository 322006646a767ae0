//! In-Memory Registration Board
//!
//! The board is the source of truth for every claim in the current week. A single mutex
//! guards the per-category entry lists together with the dirty flag, so each mutation
//! (validate, dedup, insert, re-sort, mark dirty) is observed either entirely or not at
//! all. Readers always receive owned copies and never iterate under the lock.

use super::priority::{PriorityFn, default_priority, sort_entries};
use super::types::{Board, Entry, Released};
use crate::schedule::types::Category;

use parking_lot::Mutex;
use thiserror::Error;

/// Rejections produced by [`RegistrationStore::claim`]. Both are expected outcomes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("category {0} is not served by this board")]
    InvalidCategory(Category),
    #[error("{subject_id} already holds a claim in this category")]
    Duplicate { subject_id: String },
}

struct BoardState {
    board: Board,
    dirty: bool,
    /// Bumped on every mutation; lets the persistence worker detect writes that raced
    /// with its snapshot.
    version: u64,
}

impl BoardState {
    fn touch(&mut self) {
        self.dirty = true;
        self.version = self.version.wrapping_add(1);
    }
}

pub struct RegistrationStore {
    state: Mutex<BoardState>,
    is_special: PriorityFn,
}

impl RegistrationStore {
    /// Board serving every known category, ordered with the default priority rule.
    pub fn new() -> Self {
        Self::with_categories(&Category::ALL, default_priority())
    }

    pub fn with_priority(is_special: PriorityFn) -> Self {
        Self::with_categories(&Category::ALL, is_special)
    }

    pub fn with_categories(categories: &[Category], is_special: PriorityFn) -> Self {
        let board = categories.iter().map(|c| (*c, Vec::new())).collect();
        Self {
            state: Mutex::new(BoardState {
                board,
                dirty: false,
                version: 0,
            }),
            is_special,
        }
    }

    /// Atomically inserts `entry`, returning its position in the re-sorted list.
    pub fn claim(&self, category: Category, entry: Entry) -> Result<usize, ClaimError> {
        let mut state = self.state.lock();

        let entries = state
            .board
            .get_mut(&category)
            .ok_or(ClaimError::InvalidCategory(category))?;

        if entries.iter().any(|e| e.subject_id == entry.subject_id) {
            return Err(ClaimError::Duplicate {
                subject_id: entry.subject_id,
            });
        }

        let subject_id = entry.subject_id.clone();
        entries.push(entry);
        sort_entries(&self.is_special, entries);
        let position = entries
            .iter()
            .position(|e| e.subject_id == subject_id)
            .unwrap_or(entries.len() - 1);

        state.touch();
        Ok(position)
    }

    /// Removes the entry held by `subject_id`. Returns whether one existed.
    pub fn release(&self, category: Category, subject_id: &str) -> bool {
        self.take(category, subject_id).is_some()
    }

    /// Removes the entry held by `subject_id` and reports where it sat.
    pub fn take(&self, category: Category, subject_id: &str) -> Option<Released> {
        self.take_where(category, |e| e.subject_id == subject_id)
    }

    /// Removes the first entry (in board order) whose subject id starts with `prefix`.
    pub fn take_first_with_prefix(&self, category: Category, prefix: &str) -> Option<Released> {
        self.take_where(category, |e| e.subject_id.starts_with(prefix))
    }

    fn take_where<P>(&self, category: Category, predicate: P) -> Option<Released>
    where
        P: Fn(&Entry) -> bool,
    {
        let mut state = self.state.lock();

        let entries = state.board.get_mut(&category)?;
        let position = entries.iter().position(predicate)?;
        let entry = entries.remove(position);

        state.touch();
        Some(Released { position, entry })
    }

    /// Copy of one category's ordered entries (empty for unknown categories).
    pub fn snapshot(&self, category: Category) -> Vec<Entry> {
        self.state
            .lock()
            .board
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }

    pub fn snapshot_all(&self) -> Board {
        self.state.lock().board.clone()
    }

    /// Empties every category and clears the dirty flag.
    pub fn reset_all(&self) {
        let mut state = self.state.lock();
        for entries in state.board.values_mut() {
            entries.clear();
        }
        state.dirty = false;
        state.version = state.version.wrapping_add(1);
    }

    /// Seeds the board from a persisted snapshot.
    ///
    /// Categories this board does not serve are ignored. Each list is deduplicated by
    /// subject id (first occurrence wins) and re-sorted, so a hand-edited or stale file
    /// cannot break the board's invariants. Returns the number of entries loaded.
    pub fn restore(&self, snapshot: Board) -> usize {
        let mut state = self.state.lock();
        let mut loaded = 0;

        for (category, mut incoming) in snapshot {
            let Some(entries) = state.board.get_mut(&category) else {
                tracing::warn!("Skipping snapshot entries for unserved category {}", category);
                continue;
            };

            let mut seen = std::collections::HashSet::new();
            incoming.retain(|e| seen.insert(e.subject_id.clone()));
            sort_entries(&self.is_special, &mut incoming);

            loaded += incoming.len();
            *entries = incoming;
        }

        state.dirty = false;
        loaded
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Copy of the board tagged with its version, only if there are unsaved changes.
    pub fn dirty_snapshot(&self) -> Option<(u64, Board)> {
        let state = self.state.lock();
        state
            .dirty
            .then(|| (state.version, state.board.clone()))
    }

    /// Clears the dirty flag if nothing changed since the snapshot at `version`.
    pub fn mark_clean(&self, version: u64) -> bool {
        let mut state = self.state.lock();
        if state.version == version {
            state.dirty = false;
            true
        } else {
            false
        }
    }

    pub fn entry_count(&self) -> usize {
        self.state.lock().board.values().map(Vec::len).sum()
    }
}

impl Default for RegistrationStore {
    fn default() -> Self {
        Self::new()
    }
}
