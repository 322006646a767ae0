//! Registration Gatekeeper
//!
//! Runs every claim and release through the same pipeline: rate limit, category lookup,
//! window check (skipped for managers), the atomic store operation and, for releases,
//! vacancy detection. Each step either passes or returns a typed `GateError`.

use super::error::GateError;
use super::identity::Identity;
use super::protocol::{BoardEntryView, CategoryBoard, CategoryState, ClaimRequest, ReleaseRequest};
use crate::notify::vacancy::{VacancyDecision, VacancyDetector};
use crate::ratelimit::limiter::{RateLimiter, RatePolicy};
use crate::schedule::clock::{Clock, epoch_seconds};
use crate::schedule::types::{Category, Status};
use crate::schedule::window::WindowSchedule;
use crate::storage::memory::{ClaimError, RegistrationStore};
use crate::storage::types::{Entry, EntryKind, Released, guest_prefix, sanitize_guest_name};

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimOutcome {
    pub category: Category,
    pub subject_id: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub category: Category,
    pub released: Released,
    pub vacancy: VacancyDecision,
}

pub struct Gatekeeper {
    schedule: WindowSchedule,
    clock: Arc<dyn Clock>,
    store: Arc<RegistrationStore>,
    limiter: Arc<RateLimiter>,
    policy: RatePolicy,
    vacancy: Arc<VacancyDetector>,
}

impl Gatekeeper {
    pub fn new(
        schedule: WindowSchedule,
        clock: Arc<dyn Clock>,
        store: Arc<RegistrationStore>,
        limiter: Arc<RateLimiter>,
        policy: RatePolicy,
        vacancy: Arc<VacancyDetector>,
    ) -> Self {
        Self {
            schedule,
            clock,
            store,
            limiter,
            policy,
            vacancy,
        }
    }

    pub fn store(&self) -> &Arc<RegistrationStore> {
        &self.store
    }

    pub fn claim(
        &self,
        identity: &Identity,
        rate_key: &str,
        req: &ClaimRequest,
    ) -> Result<ClaimOutcome, GateError> {
        self.admit(rate_key)?;
        let category = parse_category(&req.category)?;
        let now = self.clock.now();

        if !identity.is_manager() {
            if req.target.is_some() {
                return Err(GateError::Forbidden("only managers may claim for others".into()));
            }
            let status = self.schedule.current_status(category, &now);
            if !status.allows_claim() {
                return Err(GateError::WindowViolation { status });
            }
        }

        let (holder_id, holder_name) = match &req.target {
            Some(target) => {
                let name = target.display_name.trim();
                if target.subject_id.trim().is_empty() || name.is_empty() {
                    return Err(GateError::BadRequest("target needs an id and a name".into()));
                }
                (target.subject_id.trim(), name)
            }
            None => (identity.id.as_str(), identity.name.as_str()),
        };

        let class = category.class();
        let claimed_at = epoch_seconds(&now);
        let entry = match req.guest_name.as_deref() {
            Some(_) if !class.accepts_guest() => {
                return Err(GateError::BadRequest(format!("{} does not take guests", category)));
            }
            Some(raw) => {
                let guest = sanitize_guest_name(raw)
                    .map_err(|e| GateError::BadRequest(e.to_string()))?;
                Entry::guest(holder_id, holder_name, &guest, claimed_at)
            }
            None if class.requires_guest() => {
                return Err(GateError::BadRequest("guest name is required".into()));
            }
            None => Entry::member(holder_id, holder_name, claimed_at),
        };

        let subject_id = entry.subject_id.clone();
        let position = self.store.claim(category, entry).map_err(|e| match e {
            ClaimError::InvalidCategory(c) => GateError::InvalidCategory(c.to_string()),
            ClaimError::Duplicate { .. } => GateError::DuplicateClaim,
        })?;

        tracing::info!(
            "{} claimed {} at position {} (by {})",
            subject_id,
            category,
            position,
            identity.id
        );

        Ok(ClaimOutcome {
            category,
            subject_id,
            position,
        })
    }

    pub fn release(
        &self,
        identity: &Identity,
        rate_key: &str,
        req: &ReleaseRequest,
    ) -> Result<ReleaseOutcome, GateError> {
        self.admit(rate_key)?;
        let category = parse_category(&req.category)?;

        let target = req
            .target_subject_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let released = if identity.is_manager() {
            let target = target.unwrap_or(identity.id.as_str());
            self.store
                .take(category, target)
                .or_else(|| self.store.take_first_with_prefix(category, &guest_prefix(target)))
        } else {
            let status = self.schedule.current_status(category, &self.clock.now());
            if !status.allows_release() {
                return Err(GateError::WindowViolation { status });
            }

            let own_prefix = guest_prefix(&identity.id);
            match target {
                Some(t) if t == identity.id || t.starts_with(&own_prefix) => {
                    self.store.take(category, t)
                }
                Some(_) => {
                    return Err(GateError::Forbidden("you can only release your own entries".into()));
                }
                None => self.store.take(category, &identity.id).or_else(|| {
                    if category.class().accepts_guest() {
                        self.store.take_first_with_prefix(category, &own_prefix)
                    } else {
                        None
                    }
                }),
            }
        };

        let released = released.ok_or(GateError::NotFound)?;
        tracing::info!(
            "{} released {} from position {} (by {})",
            released.entry.subject_id,
            category,
            released.position,
            identity.id
        );

        // The store lock is already released; fan-out only touches the push queue
        let vacancy = self.vacancy.on_release(category, released.position);

        Ok(ReleaseOutcome {
            category,
            released,
            vacancy,
        })
    }

    /// Current status, countdown and entries for one category or all of them.
    pub fn board(
        &self,
        category: Option<&str>,
        privileged: bool,
    ) -> Result<Vec<CategoryBoard>, GateError> {
        let categories = match category {
            Some(name) => vec![parse_category(name)?],
            None => Category::ALL.to_vec(),
        };
        let now = self.clock.now();

        Ok(categories
            .into_iter()
            .map(|category| {
                let (deadline, _) = self.schedule.next_transition(category, &now);
                let entries = self
                    .store
                    .snapshot(category)
                    .into_iter()
                    .enumerate()
                    .map(|(position, entry)| entry_view(position, entry, privileged))
                    .collect();

                CategoryBoard {
                    category,
                    status: self.schedule.current_status(category, &now),
                    deadline_ms: deadline.timestamp_millis(),
                    entries,
                }
            })
            .collect())
    }

    pub fn category_states(&self) -> Vec<CategoryState> {
        let now = self.clock.now();

        Category::ALL
            .into_iter()
            .map(|category| {
                let (deadline, next_status) = self.schedule.next_transition(category, &now);
                CategoryState {
                    category,
                    status: self.schedule.current_status(category, &now),
                    next_status,
                    deadline_ms: deadline.timestamp_millis(),
                }
            })
            .collect()
    }

    pub fn status_of(&self, category: Category) -> Status {
        self.schedule.current_status(category, &self.clock.now())
    }

    fn admit(&self, rate_key: &str) -> Result<(), GateError> {
        if self.limiter.check(rate_key, &self.policy) {
            Ok(())
        } else {
            tracing::debug!("Rate limited {}", rate_key);
            Err(GateError::RateLimited)
        }
    }
}

fn parse_category(name: &str) -> Result<Category, GateError> {
    name.trim()
        .parse()
        .map_err(|_| GateError::InvalidCategory(name.to_string()))
}

fn entry_view(position: usize, entry: Entry, privileged: bool) -> BoardEntryView {
    let (kind, guest_name) = match entry.kind {
        EntryKind::Member => ("member", None),
        EntryKind::Guest { guest_name } => ("guest", Some(guest_name)),
    };

    BoardEntryView {
        position,
        display_name: entry.display_name,
        guest_name,
        kind: kind.to_string(),
        claimed_at: entry.claimed_at,
        subject_id: privileged.then_some(entry.subject_id),
    }
}
