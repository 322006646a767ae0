//! Storage Module Tests
//!
//! Validates the registration board and its durable snapshot.
//!
//! ## Test Scopes
//! - **RegistrationStore**: claim/release semantics, ordering, dedup under contention, reset.
//! - **Guest identity**: name sanitization and composite subject ids.
//! - **Persistence**: atomic snapshot writes, restore, corrupt and missing files, write
//!   failures retried on the next tick, the worker loop and its final flush.

#[cfg(test)]
mod tests {
    use crate::schedule::types::Category;
    use crate::storage::memory::{ClaimError, RegistrationStore};
    use crate::storage::persistence::PersistenceWorker;
    use crate::storage::priority::has_special_marker;
    use crate::storage::snapshot::SnapshotFile;
    use crate::storage::types::{
        Board, Entry, GuestNameError, guest_prefix, sanitize_guest_name,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn names(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| e.display_name.clone()).collect()
    }

    // ============================================================
    // CLAIM / RELEASE TESTS
    // ============================================================

    #[test]
    fn test_claim_returns_position_and_marks_dirty() {
        let store = RegistrationStore::new();

        let pos_a = store
            .claim(Category::WedRegular, Entry::member("a", "A", 1.0))
            .unwrap();
        let pos_b = store
            .claim(Category::WedRegular, Entry::member("b", "B", 2.0))
            .unwrap();

        assert_eq!(pos_a, 0);
        assert_eq!(pos_b, 1);
        assert!(store.is_dirty());
        assert_eq!(store.entry_count(), 2);
    }

    #[test]
    fn test_duplicate_claim_is_rejected() {
        let store = RegistrationStore::new();
        store
            .claim(Category::FriRegular, Entry::member("u1", "Kim", 1.0))
            .unwrap();

        let result = store.claim(Category::FriRegular, Entry::member("u1", "Kim", 2.0));

        assert_eq!(
            result,
            Err(ClaimError::Duplicate {
                subject_id: "u1".to_string()
            })
        );
        assert_eq!(store.snapshot(Category::FriRegular).len(), 1);
    }

    #[test]
    fn test_same_subject_may_claim_different_categories() {
        let store = RegistrationStore::new();

        assert!(
            store
                .claim(Category::WedRegular, Entry::member("u1", "Kim", 1.0))
                .is_ok()
        );
        assert!(
            store
                .claim(Category::FriRegular, Entry::member("u1", "Kim", 1.0))
                .is_ok()
        );
    }

    #[test]
    fn test_claim_into_unserved_category_leaves_board_unchanged() {
        let store = RegistrationStore::with_categories(
            &[Category::WedRegular],
            crate::storage::priority::default_priority(),
        );

        let result = store.claim(Category::FriGuest, Entry::member("u1", "Kim", 1.0));

        assert_eq!(result, Err(ClaimError::InvalidCategory(Category::FriGuest)));
        assert_eq!(store.entry_count(), 0);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_release_missing_subject_is_noop() {
        let store = RegistrationStore::new();
        store
            .claim(Category::WedRegular, Entry::member("a", "A", 1.0))
            .unwrap();
        let (version, _) = store.dirty_snapshot().unwrap();
        store.mark_clean(version);
        let before = store.snapshot_all();

        let released = store.release(Category::WedRegular, "ghost");

        assert!(!released);
        assert_eq!(store.snapshot_all(), before);
        assert!(!store.is_dirty(), "A failed release must not dirty the board");
    }

    #[test]
    fn test_take_reports_pre_release_position() {
        let store = RegistrationStore::new();
        for (id, t) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            store
                .claim(Category::FriRegular, Entry::member(id, id, t))
                .unwrap();
        }

        let released = store.take(Category::FriRegular, "b").unwrap();

        assert_eq!(released.position, 1);
        assert_eq!(released.entry.subject_id, "b");
        assert_eq!(names(&store.snapshot(Category::FriRegular)), vec!["a", "c"]);
    }

    #[test]
    fn test_take_first_with_prefix_picks_board_order() {
        let store = RegistrationStore::new();
        store
            .claim(Category::FriGuest, Entry::guest("m1", "Kim", "Second", 2.0))
            .unwrap();
        store
            .claim(Category::FriGuest, Entry::guest("m1", "Kim", "First", 1.0))
            .unwrap();
        store
            .claim(Category::FriGuest, Entry::guest("m2", "Lee", "Other", 0.5))
            .unwrap();

        let released = store
            .take_first_with_prefix(Category::FriGuest, &guest_prefix("m1"))
            .unwrap();

        assert_eq!(released.entry.guest_name(), Some("First"));
        assert_eq!(released.position, 1);
        assert_eq!(store.snapshot(Category::FriGuest).len(), 2);
    }

    // ============================================================
    // ORDERING TESTS
    // ============================================================

    #[test]
    fn test_board_orders_special_first_then_by_time() {
        let store = RegistrationStore::new();

        // ARRANGE: claims arrive out of time order, one carries a marker
        store
            .claim(Category::WedRegular, Entry::member("lee", "Lee", 3.0))
            .unwrap();
        store
            .claim(Category::WedRegular, Entry::member("park", "Park (OB)", 5.0))
            .unwrap();
        let pos = store
            .claim(Category::WedRegular, Entry::member("choi", "Choi", 1.0))
            .unwrap();

        // ASSERT
        assert_eq!(pos, 1);
        assert_eq!(
            names(&store.snapshot(Category::WedRegular)),
            vec!["Park (OB)", "Choi", "Lee"]
        );
    }

    #[test]
    fn test_special_marker_matches_guest_name_case_insensitively() {
        let alumni = Entry::guest("m1", "Kim", "Jung (Ob)", 1.0);
        let exchange = Entry::guest("m1", "Kim", "Han(교류전)", 1.0);
        let plain = Entry::guest("m1", "Kim", "Jung", 1.0);

        assert!(has_special_marker(&alumni));
        assert!(has_special_marker(&exchange));
        assert!(!has_special_marker(&plain));
    }

    #[test]
    fn test_custom_priority_predicate_is_honored() {
        let store = RegistrationStore::with_priority(Arc::new(|e: &Entry| e.subject_id == "vip"));
        store
            .claim(Category::WedRegular, Entry::member("a", "A", 1.0))
            .unwrap();
        store
            .claim(Category::WedRegular, Entry::member("vip", "V", 9.0))
            .unwrap();

        assert_eq!(names(&store.snapshot(Category::WedRegular)), vec!["V", "A"]);
    }

    // ============================================================
    // CONCURRENCY TESTS
    // ============================================================

    #[test]
    fn test_concurrent_duplicate_claims_admit_exactly_one() {
        let store = Arc::new(RegistrationStore::new());

        let results: Vec<Result<usize, ClaimError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let store = store.clone();
                    scope.spawn(move || {
                        store.claim(
                            Category::FriRegular,
                            Entry::member("same", "Same", i as f64),
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(ClaimError::Duplicate { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(store.snapshot(Category::FriRegular).len(), 1);
    }

    #[test]
    fn test_concurrent_distinct_claims_stay_sorted() {
        let store = Arc::new(RegistrationStore::new());

        std::thread::scope(|scope| {
            for i in 0..32 {
                let store = store.clone();
                scope.spawn(move || {
                    let id = format!("u{}", i);
                    store
                        .claim(Category::WedRegular, Entry::member(&id, &id, (32 - i) as f64))
                        .unwrap();
                });
            }
        });

        let entries = store.snapshot(Category::WedRegular);
        assert_eq!(entries.len(), 32);
        assert!(
            entries.windows(2).all(|w| w[0].claimed_at <= w[1].claimed_at),
            "Entries should be ordered by claim time"
        );
    }

    // ============================================================
    // RESET / RESTORE TESTS
    // ============================================================

    #[test]
    fn test_reset_all_empties_every_category_and_clears_dirty() {
        let store = RegistrationStore::new();
        for category in Category::ALL {
            store
                .claim(category, Entry::member("u1", "Kim", 1.0))
                .unwrap();
        }

        store.reset_all();

        assert!(!store.is_dirty());
        for category in Category::ALL {
            assert!(store.snapshot(category).is_empty());
        }
    }

    #[test]
    fn test_restore_dedups_and_resorts() {
        let store = RegistrationStore::new();
        let mut board = Board::new();
        board.insert(
            Category::WedRegular,
            vec![
                Entry::member("b", "B", 2.0),
                Entry::member("a", "A", 1.0),
                Entry::member("b", "B again", 3.0),
            ],
        );

        let loaded = store.restore(board);

        assert_eq!(loaded, 2);
        assert_eq!(names(&store.snapshot(Category::WedRegular)), vec!["A", "B"]);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_mark_clean_refuses_when_board_changed() {
        let store = RegistrationStore::new();
        store
            .claim(Category::WedRegular, Entry::member("a", "A", 1.0))
            .unwrap();
        let (version, _) = store.dirty_snapshot().unwrap();

        store
            .claim(Category::WedRegular, Entry::member("b", "B", 2.0))
            .unwrap();

        assert!(!store.mark_clean(version));
        assert!(store.is_dirty());
    }

    // ============================================================
    // GUEST IDENTITY TESTS
    // ============================================================

    #[test]
    fn test_sanitize_guest_name_collapses_and_escapes() {
        assert_eq!(
            sanitize_guest_name("  Kim   <b>  "),
            Ok("Kim &lt;b&gt;".to_string())
        );
        assert_eq!(sanitize_guest_name("   "), Err(GuestNameError::Empty));
        assert_eq!(sanitize_guest_name(""), Err(GuestNameError::Empty));
    }

    #[test]
    fn test_sanitize_guest_name_rejects_overlong_names() {
        // Exactly at the bound is fine; the bound counts characters, not bytes
        let at_limit = "가".repeat(20);
        assert_eq!(sanitize_guest_name(&at_limit), Ok(at_limit.clone()));

        // Two names sharing their first 20 characters must not map to one id
        let first = format!("{}-one", "a".repeat(20));
        let second = format!("{}-two", "a".repeat(20));
        assert_eq!(
            sanitize_guest_name(&first),
            Err(GuestNameError::TooLong { max: 20 })
        );
        assert_eq!(
            sanitize_guest_name(&second),
            Err(GuestNameError::TooLong { max: 20 })
        );
    }

    #[test]
    fn test_guest_subject_id_carries_member_prefix() {
        let entry = Entry::guest("m7", "Kim", "Jung", 1.0);

        assert_eq!(entry.subject_id, "guest_m7_Jung");
        assert!(entry.subject_id.starts_with(&guest_prefix("m7")));
        assert!(entry.is_guest());
    }

    // ============================================================
    // PERSISTENCE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_flush_and_restore_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = Arc::new(SnapshotFile::new(dir.path().join("board_backup.json")));

        // ARRANGE
        let store = Arc::new(RegistrationStore::new());
        store
            .claim(Category::FriGuest, Entry::guest("m1", "Kim", "Jung", 1.0))
            .unwrap();
        store
            .claim(Category::FriRegular, Entry::member("m1", "Kim", 2.0))
            .unwrap();
        let worker = PersistenceWorker::new(store.clone(), file.clone(), Duration::from_secs(3));

        // ACT
        let wrote = worker.flush().await.unwrap();
        let wrote_again = worker.flush().await.unwrap();

        let fresh = Arc::new(RegistrationStore::new());
        let restorer = PersistenceWorker::new(fresh.clone(), file, Duration::from_secs(3));
        let loaded = restorer.restore().await;

        // ASSERT
        assert!(wrote);
        assert!(!wrote_again, "A clean board should not be rewritten");
        assert!(!store.is_dirty());
        assert_eq!(loaded, 2);
        assert_eq!(fresh.snapshot_all(), store.snapshot_all());
    }

    #[tokio::test]
    async fn test_snapshot_uses_category_names_as_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board_backup.json");
        let store = Arc::new(RegistrationStore::new());
        store
            .claim(Category::WedLesson, Entry::member("u1", "Kim", 1.0))
            .unwrap();
        let worker = PersistenceWorker::new(
            store,
            Arc::new(SnapshotFile::new(&path)),
            Duration::from_secs(3),
        );

        worker.flush().await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["WED_LESSON"][0]["subject_id"], "u1");
        assert_eq!(raw["WED_LESSON"][0]["kind"], "member");
    }

    #[tokio::test]
    async fn test_restore_from_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board_backup.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = Arc::new(RegistrationStore::new());
        let worker = PersistenceWorker::new(
            store.clone(),
            Arc::new(SnapshotFile::new(&path)),
            Duration::from_secs(3),
        );

        assert_eq!(worker.restore().await, 0);
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_restore_skips_unknown_categories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board_backup.json");
        let document = serde_json::json!({
            "SUN_SPECIAL": [
                { "subject_id": "x", "display_name": "X", "kind": "member", "claimed_at": 1.0 }
            ],
            "FRI_REGULAR": [
                { "subject_id": "y", "display_name": "Y", "kind": "member", "claimed_at": 2.0 }
            ]
        });
        std::fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

        let store = Arc::new(RegistrationStore::new());
        let worker = PersistenceWorker::new(
            store.clone(),
            Arc::new(SnapshotFile::new(&path)),
            Duration::from_secs(3),
        );

        assert_eq!(worker.restore().await, 1);
        assert_eq!(store.snapshot(Category::FriRegular)[0].subject_id, "y");
    }

    #[tokio::test]
    async fn test_missing_file_restore_and_discard_are_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let file = Arc::new(SnapshotFile::new(dir.path().join("absent.json")));
        let store = Arc::new(RegistrationStore::new());
        let worker = PersistenceWorker::new(store, file.clone(), Duration::from_secs(3));

        assert_eq!(worker.restore().await, 0);
        assert!(file.discard().await.is_ok());
    }

    #[tokio::test]
    async fn test_store_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("nested").join("capacity.json"));

        file.store(&serde_json::json!({ "wed": 20 })).await.unwrap();
        let loaded: serde_json::Value = file.load().await.unwrap();

        assert_eq!(loaded["wed"], 20);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_board_dirty_until_next_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board_backup.json");
        // A directory squatting on the target makes the final rename fail
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), b"x").unwrap();

        // ARRANGE
        let store = Arc::new(RegistrationStore::new());
        store
            .claim(Category::WedRegular, Entry::member("u1", "Kim", 1.0))
            .unwrap();
        let worker = PersistenceWorker::new(
            store.clone(),
            Arc::new(SnapshotFile::new(&path)),
            Duration::from_secs(3),
        );

        // ACT
        let failed = worker.flush().await;

        // ASSERT: the error surfaces, nothing is lost and no temp file is left behind
        assert!(failed.is_err());
        assert!(store.is_dirty());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("board_backup.json")]);

        // ACT: the obstruction goes away and the next tick succeeds
        std::fs::remove_dir_all(&path).unwrap();
        let wrote = worker.flush().await.unwrap();

        // ASSERT
        assert!(wrote);
        assert!(!store.is_dirty());
        let fresh = Arc::new(RegistrationStore::new());
        let restored = PersistenceWorker::new(
            fresh.clone(),
            Arc::new(SnapshotFile::new(&path)),
            Duration::from_secs(3),
        )
        .restore()
        .await;
        assert_eq!(restored, 1);
        assert_eq!(fresh.snapshot(Category::WedRegular)[0].subject_id, "u1");
    }

    #[tokio::test]
    async fn test_run_flushes_on_tick_and_once_more_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board_backup.json");

        // ARRANGE
        let store = Arc::new(RegistrationStore::new());
        store
            .claim(Category::FriRegular, Entry::member("u1", "Kim", 1.0))
            .unwrap();
        let worker = PersistenceWorker::new(
            store.clone(),
            Arc::new(SnapshotFile::new(&path)),
            Duration::from_millis(10),
        );
        let cancel = tokio_util::sync::CancellationToken::new();
        let handle = tokio::spawn(worker.run(cancel.clone()));

        // ACT: wait for a tick to write the first claim
        tokio::time::timeout(Duration::from_secs(5), async {
            while store.is_dirty() || !path.exists() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("a tick should flush the dirty board");

        store
            .claim(Category::FriRegular, Entry::member("u2", "Lee", 2.0))
            .unwrap();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker should stop after cancel")
            .unwrap();

        // ASSERT: the claim made just before shutdown reached the file
        assert!(!store.is_dirty());
        let fresh = Arc::new(RegistrationStore::new());
        let restored = PersistenceWorker::new(
            fresh,
            Arc::new(SnapshotFile::new(&path)),
            Duration::from_secs(3),
        )
        .restore()
        .await;
        assert_eq!(restored, 2);
    }
}
