//! Weekly Admission Windows
//!
//! Every category follows a fixed timetable of status transitions expressed as offsets
//! from the start of the weekly cycle. Evaluating the timetable is pure: the same
//! `(category, instant)` pair always yields the same status.

use super::types::{Category, Status};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Weekday};
use std::collections::HashMap;

const fn minutes(days: i64, hours: i64, mins: i64) -> i64 {
    (days * 24 + hours) * 60 + mins
}

const WED_REGULAR: &[(i64, Status)] = &[
    (0, Status::BeforeOpen),
    (minutes(0, 22, 0), Status::Open),
    (minutes(1, 10, 0), Status::CancelOnly),
    (minutes(4, 0, 0), Status::Closed),
];
const WED_GUEST: &[(i64, Status)] = &[
    (0, Status::BeforeOpen),
    (minutes(0, 22, 1), Status::Open),
    (minutes(4, 18, 0), Status::Closed),
];
const WED_LEFTOVER: &[(i64, Status)] = &[
    (0, Status::BeforeOpen),
    (minutes(1, 22, 1), Status::Open),
    (minutes(4, 18, 0), Status::Closed),
];
const WED_LESSON: &[(i64, Status)] = &[
    (0, Status::BeforeOpen),
    (minutes(1, 22, 0), Status::Open),
    (minutes(4, 18, 0), Status::Closed),
];
const FRI_REGULAR: &[(i64, Status)] = &[
    (0, Status::BeforeOpen),
    (minutes(0, 22, 0), Status::Open),
    (minutes(1, 10, 0), Status::CancelOnly),
    (minutes(6, 0, 0), Status::Closed),
];
const FRI_GUEST: &[(i64, Status)] = &[
    (0, Status::BeforeOpen),
    (minutes(0, 22, 1), Status::Open),
    (minutes(6, 17, 0), Status::Closed),
];
const FRI_LEFTOVER: &[(i64, Status)] = &[
    (0, Status::BeforeOpen),
    (minutes(1, 22, 1), Status::Open),
    (minutes(6, 17, 0), Status::Closed),
];

fn default_timetable(category: Category) -> &'static [(i64, Status)] {
    match category {
        Category::WedRegular => WED_REGULAR,
        Category::WedGuest => WED_GUEST,
        Category::WedLeftover => WED_LEFTOVER,
        Category::WedLesson => WED_LESSON,
        Category::FriRegular => FRI_REGULAR,
        Category::FriGuest => FRI_GUEST,
        Category::FriLeftover => FRI_LEFTOVER,
    }
}

/// Anchor of the weekly cycle: a weekday and a local time of day in a fixed zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCycle {
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub offset: FixedOffset,
}

impl WeekCycle {
    /// Returns `None` when `hour` is not a valid hour of the day.
    pub fn new(weekday: Weekday, hour: u32, offset: FixedOffset) -> Option<Self> {
        Some(Self {
            weekday,
            start: NaiveTime::from_hms_opt(hour, 0, 0)?,
            offset,
        })
    }

    /// The most recent cycle start at or before `now`.
    pub fn week_start(&self, now: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let local = now.with_timezone(&self.offset);
        let days_since = (local.weekday().num_days_from_monday() + 7
            - self.weekday.num_days_from_monday())
            % 7;
        let start = self.local_at(local.date_naive() - Duration::days(days_since as i64));

        // Same weekday but before the start hour belongs to the previous cycle
        if start > *now {
            start - Duration::days(7)
        } else {
            start
        }
    }

    /// The first cycle start strictly after `now`. An instant exactly on a boundary
    /// points at the following week.
    pub fn next_cycle_start(&self, now: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        self.week_start(now) + Duration::days(7)
    }

    fn local_at(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        let naive = date.and_time(self.start);
        DateTime::from_naive_utc_and_offset(naive - self.offset, self.offset)
    }
}

/// One entry of a category's timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub offset: Duration,
    pub status: Status,
}

/// The per-category window state machine.
#[derive(Debug, Clone)]
pub struct WindowSchedule {
    cycle: WeekCycle,
    timetables: HashMap<Category, Vec<Transition>>,
}

impl WindowSchedule {
    /// Builds the schedule with the standard weekly timetable.
    pub fn new(cycle: WeekCycle) -> Self {
        let timetables = Category::ALL
            .into_iter()
            .map(|category| {
                let transitions = default_timetable(category)
                    .iter()
                    .map(|&(mins, status)| Transition {
                        offset: Duration::minutes(mins),
                        status,
                    })
                    .collect();
                (category, transitions)
            })
            .collect();

        Self { cycle, timetables }
    }

    /// Replaces one category's timetable. `transitions` must already be time-ordered.
    pub fn with_timetable(mut self, category: Category, transitions: Vec<Transition>) -> Self {
        self.timetables.insert(category, transitions);
        self
    }

    pub fn cycle(&self) -> &WeekCycle {
        &self.cycle
    }

    /// Status of `category` at `now`.
    ///
    /// Scans the time-ordered timetable and keeps the last transition that has already
    /// happened; if two transitions share a timestamp the later declaration wins.
    /// Categories with no transition at or before `now` are `Closed`.
    pub fn current_status(&self, category: Category, now: &DateTime<FixedOffset>) -> Status {
        let week_start = self.cycle.week_start(now);
        let mut status = Status::Closed;

        for transition in self.transitions(category) {
            if *now >= week_start + transition.offset {
                status = transition.status;
            } else {
                break;
            }
        }

        status
    }

    /// The next transition strictly after `now`.
    ///
    /// When the cycle has no transitions left the start of the next cycle is returned
    /// together with `BeforeOpen`, so the instant is always usable as a countdown target.
    pub fn next_transition(
        &self,
        category: Category,
        now: &DateTime<FixedOffset>,
    ) -> (DateTime<FixedOffset>, Status) {
        let week_start = self.cycle.week_start(now);

        self.transitions(category)
            .iter()
            .map(|transition| (week_start + transition.offset, transition.status))
            .find(|(at, _)| at > now)
            .unwrap_or((week_start + Duration::days(7), Status::BeforeOpen))
    }

    fn transitions(&self, category: Category) -> &[Transition] {
        self.timetables
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
