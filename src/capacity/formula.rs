//! Effective Capacity
//!
//! How many entries of a category count as confirmed (as opposed to waiting-list) for a
//! given day total. The rule differs per category class and depends on how the day's
//! guest list is composed, so it is kept as data: a policy per day and a formula per
//! class.

use crate::schedule::types::{Category, CategoryClass, Day};
use crate::storage::priority::{PriorityFn, default_priority};
use crate::storage::types::Board;

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPolicy {
    /// Guest seats carved out of the day total for ordinary (non-special) guests.
    pub guest_fixed_seats: u32,
}

/// How a class derives its cutoff from the day total and the guest composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityFormula {
    /// `total - reserved_guests`
    TotalMinusReservedGuests,
    /// `special_guests + guest_fixed_seats`; special guests sit outside the total.
    SpecialGuestsPlusFixed,
    /// `total - regular_claims - reserved_guests`, never below zero.
    RemainderAfterRegulars,
}

/// Day-level inputs read from the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Composition {
    pub special_guests: u32,
    pub plain_guests: u32,
    pub regular_claims: u32,
}

impl Composition {
    pub fn reserved_guests(&self, policy: &DayPolicy) -> u32 {
        policy.guest_fixed_seats.min(self.plain_guests)
    }
}

pub struct CapacityTable {
    day_policies: HashMap<Day, DayPolicy>,
    formulas: HashMap<CategoryClass, CapacityFormula>,
    is_special: PriorityFn,
}

impl CapacityTable {
    pub fn new(is_special: PriorityFn) -> Self {
        Self {
            day_policies: HashMap::new(),
            formulas: HashMap::new(),
            is_special,
        }
    }

    /// The club's standing rules: two fixed guest seats on Friday, none on Wednesday.
    /// Lessons are not tracked.
    pub fn standard() -> Self {
        Self::new(default_priority())
            .with_day(Day::Wed, DayPolicy { guest_fixed_seats: 0 })
            .with_day(Day::Fri, DayPolicy { guest_fixed_seats: 2 })
            .with_formula(CategoryClass::Regular, CapacityFormula::TotalMinusReservedGuests)
            .with_formula(CategoryClass::Guest, CapacityFormula::SpecialGuestsPlusFixed)
            .with_formula(CategoryClass::Leftover, CapacityFormula::RemainderAfterRegulars)
    }

    pub fn with_day(mut self, day: Day, policy: DayPolicy) -> Self {
        self.day_policies.insert(day, policy);
        self
    }

    pub fn with_formula(mut self, class: CategoryClass, formula: CapacityFormula) -> Self {
        self.formulas.insert(class, formula);
        self
    }

    pub fn formula(&self, class: CategoryClass) -> Option<CapacityFormula> {
        self.formulas.get(&class).copied()
    }

    /// Counts the day's guests and regular claims on `board`.
    pub fn composition(&self, day: Day, board: &Board) -> Composition {
        let guests = board.get(&day.guest()).map(Vec::as_slice).unwrap_or(&[]);
        let special_guests = guests.iter().filter(|e| (self.is_special)(*e)).count() as u32;

        Composition {
            special_guests,
            plain_guests: guests.len() as u32 - special_guests,
            regular_claims: board.get(&day.regular()).map_or(0, |v| v.len() as u32),
        }
    }

    /// Confirmed-entry cutoff for `category` given the day `total`.
    ///
    /// `None` when the category's class has no formula (it is not capacity-tracked).
    pub fn effective_capacity(&self, category: Category, total: u32, board: &Board) -> Option<u32> {
        let formula = self.formula(category.class())?;
        let day = category.day();
        let policy = self
            .day_policies
            .get(&day)
            .copied()
            .unwrap_or(DayPolicy { guest_fixed_seats: 0 });
        let composition = self.composition(day, board);

        Some(apply(formula, total, &policy, &composition))
    }
}

pub fn apply(
    formula: CapacityFormula,
    total: u32,
    policy: &DayPolicy,
    composition: &Composition,
) -> u32 {
    let reserved = composition.reserved_guests(policy);
    match formula {
        CapacityFormula::TotalMinusReservedGuests => total.saturating_sub(reserved),
        CapacityFormula::SpecialGuestsPlusFixed => {
            composition.special_guests + policy.guest_fixed_seats
        }
        CapacityFormula::RemainderAfterRegulars => total
            .saturating_sub(composition.regular_claims)
            .saturating_sub(reserved),
    }
}

/// A release at `position` frees a confirmed seat iff it sat inside the cutoff.
pub fn is_vacancy(position: usize, capacity: u32) -> bool {
    position < capacity as usize
}
