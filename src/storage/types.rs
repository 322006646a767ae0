use crate::schedule::types::Category;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Maximum length (in characters) of a sanitized guest name.
pub const MAX_GUEST_NAME_CHARS: usize = 20;

const GUEST_ID_PREFIX: &str = "guest_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuestNameError {
    #[error("guest name is empty")]
    Empty,
    #[error("guest name is longer than {max} characters")]
    TooLong { max: usize },
}

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Who a claim is for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryKind {
    /// The claiming member holds the slot themselves.
    Member,
    /// A member holds the slot on behalf of a named guest.
    Guest { guest_name: String },
}

/// One claimed slot. Entries are immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Dedup key within a category. Guests use `guest_{member}_{name}`.
    pub subject_id: String,
    pub display_name: String,
    #[serde(flatten)]
    pub kind: EntryKind,
    /// Seconds since the Unix epoch.
    pub claimed_at: f64,
}

impl Entry {
    pub fn member(subject_id: &str, display_name: &str, claimed_at: f64) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            display_name: display_name.to_string(),
            kind: EntryKind::Member,
            claimed_at,
        }
    }

    /// A guest entry held by `member_id`. `guest_name` must already be sanitized.
    pub fn guest(member_id: &str, display_name: &str, guest_name: &str, claimed_at: f64) -> Self {
        Self {
            subject_id: guest_subject_id(member_id, guest_name),
            display_name: display_name.to_string(),
            kind: EntryKind::Guest {
                guest_name: guest_name.to_string(),
            },
            claimed_at,
        }
    }

    pub fn guest_name(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Member => None,
            EntryKind::Guest { guest_name } => Some(guest_name),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self.kind, EntryKind::Guest { .. })
    }
}

/// Category → entries, each list kept in priority order.
pub type Board = BTreeMap<Category, Vec<Entry>>;

/// Entry returned by an atomic removal, with its index before the removal.
#[derive(Debug, Clone, PartialEq)]
pub struct Released {
    pub position: usize,
    pub entry: Entry,
}

pub fn guest_subject_id(member_id: &str, guest_name: &str) -> String {
    format!("{}{}_{}", GUEST_ID_PREFIX, member_id, guest_name)
}

/// Prefix shared by every guest entry a member holds.
pub fn guest_prefix(member_id: &str) -> String {
    format!("{}{}_", GUEST_ID_PREFIX, member_id)
}

/// Normalizes a free-text guest name for display and for use inside a subject id.
///
/// Whitespace runs collapse to a single space and markup characters are escaped.
/// Names longer than [`MAX_GUEST_NAME_CHARS`] (before escaping) are rejected rather than
/// cut, since two cut names could collide on the same subject id.
pub fn sanitize_guest_name(raw: &str) -> Result<String, GuestNameError> {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let cleaned: String = collapsed.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(GuestNameError::Empty);
    }
    if cleaned.chars().count() > MAX_GUEST_NAME_CHARS {
        return Err(GuestNameError::TooLong {
            max: MAX_GUEST_NAME_CHARS,
        });
    }

    let mut escaped = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    Ok(escaped)
}
