//! Schedule Module Tests
//!
//! ## Test Scopes
//! - **WeekCycle**: cycle boundaries in the local zone, including exact-boundary instants.
//! - **WindowSchedule**: status evaluation and next-transition lookups for the weekly timetable.
//! - **WeeklyResetScheduler**: boundary selection, completeness of the reset and its
//!   ordering against a concurrent board flush.

#[cfg(test)]
mod tests {
    use crate::capacity::store::{Capacities, CapacityCache};
    use crate::notify::prefs::WeeklyState;
    use crate::schedule::clock::{Clock, ManualClock};
    use crate::schedule::reset::{WeeklyResetScheduler, next_reset_after};
    use crate::schedule::types::{Category, Day, Status};
    use crate::schedule::window::{Transition, WeekCycle, WindowSchedule};
    use crate::storage::memory::RegistrationStore;
    use crate::storage::persistence::PersistenceWorker;
    use crate::storage::snapshot::SnapshotFile;
    use crate::storage::types::Entry;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Weekday};
    use std::sync::Arc;

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    /// 2024-06-01 is a Saturday.
    fn at(day: u32, hour: u32, min: u32) -> DateTime<FixedOffset> {
        kst().with_ymd_and_hms(2024, 6, day, hour, min, 0).unwrap()
    }

    fn cycle() -> WeekCycle {
        WeekCycle::new(Weekday::Sat, 0, kst()).unwrap()
    }

    fn schedule() -> WindowSchedule {
        WindowSchedule::new(cycle())
    }

    // ============================================================
    // WEEK CYCLE TESTS
    // ============================================================

    #[test]
    fn test_week_start_is_previous_saturday_midnight() {
        assert_eq!(cycle().week_start(&at(7, 15, 30)), at(1, 0, 0));
        assert_eq!(cycle().week_start(&at(1, 0, 0)), at(1, 0, 0));
        assert_eq!(cycle().week_start(&at(8, 0, 0)), at(8, 0, 0));
    }

    #[test]
    fn test_next_cycle_start_skips_exact_boundary() {
        assert_eq!(cycle().next_cycle_start(&at(5, 12, 0)), at(8, 0, 0));
        assert_eq!(
            cycle().next_cycle_start(&at(8, 0, 0)),
            kst().with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_week_start_respects_local_zone_for_utc_input() {
        // 2024-06-07T15:30Z is already Saturday 00:30 in UTC+9
        let utc = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 7, 15, 30, 0)
            .unwrap();

        assert_eq!(cycle().week_start(&utc), at(8, 0, 0));
    }

    #[test]
    fn test_invalid_cycle_hour_is_rejected() {
        assert!(WeekCycle::new(Weekday::Sat, 24, kst()).is_none());
    }

    // ============================================================
    // WINDOW STATE MACHINE TESTS
    // ============================================================

    #[test]
    fn test_regular_category_walks_through_all_phases() {
        let schedule = schedule();
        let c = Category::WedRegular;

        assert_eq!(schedule.current_status(c, &at(1, 21, 59)), Status::BeforeOpen);
        assert_eq!(schedule.current_status(c, &at(1, 22, 0)), Status::Open);
        assert_eq!(schedule.current_status(c, &at(2, 9, 59)), Status::Open);
        assert_eq!(schedule.current_status(c, &at(2, 10, 0)), Status::CancelOnly);
        assert_eq!(schedule.current_status(c, &at(4, 23, 59)), Status::CancelOnly);
        assert_eq!(schedule.current_status(c, &at(5, 0, 0)), Status::Closed);
    }

    #[test]
    fn test_guest_category_opens_one_minute_after_regular() {
        let schedule = schedule();

        assert_eq!(
            schedule.current_status(Category::WedGuest, &at(1, 22, 0)),
            Status::BeforeOpen
        );
        assert_eq!(
            schedule.current_status(Category::WedGuest, &at(1, 22, 1)),
            Status::Open
        );
    }

    #[test]
    fn test_friday_guest_closes_friday_evening() {
        let schedule = schedule();

        assert_eq!(
            schedule.current_status(Category::FriGuest, &at(7, 16, 59)),
            Status::Open
        );
        assert_eq!(
            schedule.current_status(Category::FriGuest, &at(7, 17, 0)),
            Status::Closed
        );
    }

    #[test]
    fn test_next_transition_within_cycle() {
        let (when, status) = schedule().next_transition(Category::WedRegular, &at(1, 12, 0));

        assert_eq!(when, at(1, 22, 0));
        assert_eq!(status, Status::Open);
    }

    #[test]
    fn test_next_transition_is_strictly_after_now() {
        let (when, status) = schedule().next_transition(Category::WedRegular, &at(1, 22, 0));

        assert_eq!(when, at(2, 10, 0));
        assert_eq!(status, Status::CancelOnly);
    }

    #[test]
    fn test_next_transition_after_last_points_at_next_cycle() {
        let (when, status) = schedule().next_transition(Category::WedRegular, &at(6, 12, 0));

        assert_eq!(when, at(8, 0, 0));
        assert_eq!(status, Status::BeforeOpen);
    }

    #[test]
    fn test_status_defaults_to_closed_before_first_transition() {
        let schedule = schedule().with_timetable(
            Category::WedLesson,
            vec![Transition {
                offset: Duration::hours(1),
                status: Status::Open,
            }],
        );

        assert_eq!(
            schedule.current_status(Category::WedLesson, &at(1, 0, 30)),
            Status::Closed
        );
    }

    #[test]
    fn test_simultaneous_transitions_later_declaration_wins() {
        let schedule = schedule().with_timetable(
            Category::WedLesson,
            vec![
                Transition {
                    offset: Duration::hours(1),
                    status: Status::Open,
                },
                Transition {
                    offset: Duration::hours(1),
                    status: Status::Closed,
                },
            ],
        );

        assert_eq!(
            schedule.current_status(Category::WedLesson, &at(1, 2, 0)),
            Status::Closed
        );
    }

    #[test]
    fn test_status_is_deterministic() {
        let schedule = schedule();
        let now = at(3, 8, 15);

        for category in Category::ALL {
            assert_eq!(
                schedule.current_status(category, &now),
                schedule.current_status(category, &now)
            );
        }
    }

    #[test]
    fn test_status_gates() {
        assert!(Status::Open.allows_claim());
        assert!(!Status::CancelOnly.allows_claim());
        assert!(Status::CancelOnly.allows_release());
        assert!(!Status::BeforeOpen.allows_release());
        assert!(!Status::Closed.allows_release());
    }

    #[test]
    fn test_category_parses_from_wire_name() {
        assert_eq!("FRI_LEFTOVER".parse::<Category>(), Ok(Category::FriLeftover));
        assert!("nonexistent".parse::<Category>().is_err());
        assert_eq!(
            serde_json::to_string(&Category::WedLesson).unwrap(),
            "\"WED_LESSON\""
        );
    }

    // ============================================================
    // WEEKLY RESET TESTS
    // ============================================================

    #[test]
    fn test_next_reset_after_regular_instant() {
        assert_eq!(next_reset_after(&cycle(), &at(3, 5, 0), None), at(8, 0, 0));
    }

    #[test]
    fn test_next_reset_never_repeats_fired_boundary() {
        // Clock reads slightly behind the boundary that just fired
        let fired = at(8, 0, 0);
        let now = fired - Duration::seconds(2);

        let next = next_reset_after(&cycle(), &now, Some(&fired));

        assert_eq!(next, kst().with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_next_reset_after_late_wakeup() {
        let fired = at(8, 0, 0);
        let now = fired + Duration::seconds(5);

        let next = next_reset_after(&cycle(), &now, Some(&fired));

        assert_eq!(next, kst().with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_reset_now_clears_all_weekly_state() {
        let dir = tempfile::tempdir().unwrap();

        // ARRANGE: a week's worth of state, plus a board snapshot on disk
        let store = Arc::new(RegistrationStore::new());
        store
            .claim(Category::WedRegular, Entry::member("u1", "Kim", 1.0))
            .unwrap();
        store
            .claim(Category::FriGuest, Entry::guest("u1", "Kim", "Jung", 2.0))
            .unwrap();

        let board_file = Arc::new(SnapshotFile::new(dir.path().join("board_backup.json")));
        board_file.store(&serde_json::json!({})).await.unwrap();

        let capacities =
            Arc::new(CapacityCache::load(SnapshotFile::new(dir.path().join("capacity.json"))).await);
        capacities
            .update(Capacities {
                wed: Some(20),
                fri: Some(24),
            })
            .await;

        let weekly = Arc::new(WeeklyState::new());
        weekly.confirm(Day::Wed);
        weekly.set_pref("u1", Category::WedRegular, true);

        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(at(7, 23, 59)));
        let scheduler = WeeklyResetScheduler::new(
            cycle(),
            clock,
            store.clone(),
            board_file.clone(),
            capacities.clone(),
            weekly.clone(),
        );

        // ACT
        scheduler.reset_now().await;

        // ASSERT
        assert_eq!(store.entry_count(), 0);
        assert!(!store.is_dirty());
        assert!(!board_file.path().exists());
        assert_eq!(capacities.get(Day::Wed), None);
        assert_eq!(capacities.get(Day::Fri), None);
        assert!(!weekly.is_confirmed(Day::Wed));
        assert!(weekly.prefs_for("u1").is_empty());

        let reloaded = CapacityCache::load(SnapshotFile::new(dir.path().join("capacity.json"))).await;
        assert_eq!(reloaded.snapshot(), Capacities::default());
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(at(3, 12, 0)));
        let scheduler = WeeklyResetScheduler::new(
            cycle(),
            clock,
            Arc::new(RegistrationStore::new()),
            Arc::new(SnapshotFile::new(dir.path().join("board_backup.json"))),
            Arc::new(CapacityCache::load(SnapshotFile::new(dir.path().join("capacity.json"))).await),
            Arc::new(WeeklyState::new()),
        );
        let cancel = tokio_util::sync::CancellationToken::new();

        let handle = tokio::spawn(scheduler.run(cancel.clone()));
        cancel.cancel();

        let joined = tokio::time::timeout(std::time::Duration::from_secs(2), handle).await;
        assert!(joined.is_ok(), "Scheduler should exit promptly after cancel");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reset_racing_a_flush_leaves_no_stale_board_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board_backup.json");

        // ARRANGE
        let store = Arc::new(RegistrationStore::new());
        let board_file = Arc::new(SnapshotFile::new(&path));
        let worker = PersistenceWorker::new(
            store.clone(),
            board_file.clone(),
            std::time::Duration::from_secs(3),
        );
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(at(7, 23, 59)));
        let scheduler = WeeklyResetScheduler::new(
            cycle(),
            clock,
            store.clone(),
            board_file.clone(),
            Arc::new(CapacityCache::load(SnapshotFile::new(dir.path().join("capacity.json"))).await),
            Arc::new(WeeklyState::new()),
        );

        for round in 0..50 {
            for i in 0..200 {
                store
                    .claim(
                        Category::WedRegular,
                        Entry::member(&format!("u{}", i), "Member", i as f64),
                    )
                    .unwrap();
            }

            // ACT: the flush and the reset run concurrently
            let flushing = tokio::spawn({
                let worker = worker.clone();
                async move { worker.flush().await }
            });
            scheduler.reset_now().await;
            flushing.await.unwrap().unwrap();

            // ASSERT: whatever the interleaving, a restart sees an empty board
            let fresh = Arc::new(RegistrationStore::new());
            let restored = PersistenceWorker::new(
                fresh.clone(),
                Arc::new(SnapshotFile::new(&path)),
                std::time::Duration::from_secs(3),
            )
            .restore()
            .await;
            assert_eq!(restored, 0, "last week's board survived the reset in round {}", round);
            assert_eq!(store.entry_count(), 0);
        }
    }
}
