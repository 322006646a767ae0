//! Board Ordering
//!
//! Entries carrying a special marker in their display or guest name sort ahead of
//! everyone else; within each group the earlier claim comes first.

use super::types::Entry;

use std::cmp::Ordering;
use std::sync::Arc;

/// Predicate deciding whether an entry jumps ahead of normal claims.
pub type PriorityFn = Arc<dyn Fn(&Entry) -> bool + Send + Sync>;

/// Substrings (matched case-insensitively) that mark an alumni or exchange-match guest.
pub const SPECIAL_MARKERS: [&str; 2] = ["(ob)", "(교류전)"];

pub fn has_special_marker(entry: &Entry) -> bool {
    let matches = |text: &str| {
        let lowered = text.to_lowercase();
        SPECIAL_MARKERS.iter().any(|marker| lowered.contains(marker))
    };

    matches(&entry.display_name) || entry.guest_name().is_some_and(matches)
}

pub fn default_priority() -> PriorityFn {
    Arc::new(has_special_marker)
}

/// Orders by `(not special, claimed_at)` ascending.
pub fn compare(is_special: &PriorityFn, a: &Entry, b: &Entry) -> Ordering {
    (!is_special(a))
        .cmp(&!is_special(b))
        .then_with(|| a.claimed_at.total_cmp(&b.claimed_at))
}

pub fn sort_entries(is_special: &PriorityFn, entries: &mut [Entry]) {
    entries.sort_by(|a, b| compare(is_special, a, b));
}
