//! Store integration tests
//!
//! Drives the coordinator end to end:
//! - Append ordering and identifier round-trips
//! - Flush priority (oldest snapshot before rotation)
//! - Deletion guard for the live daily file
//! - Concurrent appends

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use receipt_drop::{AppendCoordinator, FieldSet, Record, Source, StoreError, StoreLayout, TabularStore};
use tempfile::TempDir;

fn open_store() -> (AppendCoordinator, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = AppendCoordinator::open(StoreLayout::new(temp_dir.path()), FieldSet::default())
        .expect("Failed to open store");
    (store, temp_dir)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

fn receipt(voucher: &str, box_: &str, site: &str) -> Record {
    Record::new()
        .with("voucher", voucher)
        .with("box", box_)
        .with("site", site)
}

fn daily_rows(store: &AppendCoordinator, date: NaiveDate) -> Vec<Vec<String>> {
    let tabular = TabularStore::new(store.layout().clone(), store.fields().clone());
    tabular.load(&store.layout().daily_path(date))
}

#[test]
fn test_submit_flush_scenario() {
    let (store, _temp_dir) = open_store();

    // Two receipts on the same day
    store.submit_on(day(), &receipt("A1", "B", "S")).unwrap();
    let second = store.submit_on(day(), &receipt("A2", "B2", "S2")).unwrap();
    assert_eq!(second.row_count, 2);
    assert_eq!(daily_rows(&store, day()).len(), 2);

    // No snapshots yet: flush rotates the daily file
    let first_flush = store.flush_on(day()).unwrap().expect("rotation");
    assert_eq!(first_flush.source, Source::Rotated);
    assert!(!store.layout().daily_path(day()).exists());
    assert_eq!(store.list().unwrap(), vec![first_flush.name.clone()]);

    // A new daily file starts from one row
    let after = store.submit_on(day(), &receipt("A3", "B3", "S3")).unwrap();
    assert_eq!(after.row_count, 1);
    assert_eq!(daily_rows(&store, day()), vec![vec!["A3", "B3", "S3"]]);

    // The first rotation is still served, not the new daily file
    let second_flush = store.flush_on(day()).unwrap().expect("snapshot");
    assert_eq!(second_flush.source, Source::Snapshot);
    assert_eq!(second_flush.name, first_flush.name);
    assert!(store.layout().daily_path(day()).exists());
}

#[test]
fn test_flush_drains_before_rotating_again() {
    let (store, _temp_dir) = open_store();

    store.submit_on(day(), &receipt("A1", "", "")).unwrap();
    let first = store.flush_on(day()).unwrap().unwrap().name;

    store.submit_on(day(), &receipt("A2", "", "")).unwrap();
    assert_eq!(store.flush_on(day()).unwrap().unwrap().name, first);

    // Consumer acknowledges by deleting; the next flush rotates
    store.delete(&first).unwrap();
    let second = store.flush_on(day()).unwrap().unwrap();
    assert_eq!(second.source, Source::Rotated);
    assert_ne!(second.name, first);

    let listed = store.list().unwrap();
    assert_eq!(listed, vec![second.name.clone()]);
}

#[test]
fn test_list_is_fifo_and_matches_flush() {
    let (store, _temp_dir) = open_store();
    let mut rotated = Vec::new();

    for i in 0..3 {
        store
            .submit_on(day(), &receipt(&format!("V{}", i), "", ""))
            .unwrap();
        // Rotate directly so several snapshots pile up
        let layout = store.layout().clone();
        let queue = receipt_drop::SnapshotQueue::new(layout.clone());
        rotated.push(queue.rotate(&layout.daily_path(day())).unwrap());
    }

    let listed = store.list().unwrap();
    assert_eq!(listed, rotated);
    assert_eq!(store.flush_on(day()).unwrap().unwrap().name, listed[0]);
}

#[test]
fn test_identifier_round_trips_as_text() {
    let (store, _temp_dir) = open_store();

    for voucher in ["00012", "0", "1e5", "123456789012345678901234"] {
        store.submit_on(day(), &receipt(voucher, "", "")).unwrap();
    }

    let vouchers: Vec<String> = daily_rows(&store, day())
        .into_iter()
        .map(|row| row[0].clone())
        .collect();
    assert_eq!(vouchers, vec!["00012", "0", "1e5", "123456789012345678901234"]);
}

#[test]
fn test_days_use_separate_files() {
    let (store, _temp_dir) = open_store();
    let next_day = day().succ_opt().unwrap();

    store.submit_on(day(), &receipt("A1", "", "")).unwrap();
    let outcome = store.submit_on(next_day, &receipt("B1", "", "")).unwrap();

    assert_eq!(outcome.row_count, 1);
    assert_eq!(outcome.file, "delivery_requests_20240604.xlsx");
    assert!(store.layout().daily_path(day()).exists());
}

#[test]
fn test_delete_guards() {
    let (store, _temp_dir) = open_store();
    store.submit_on(day(), &receipt("A1", "", "")).unwrap();
    let daily = store.layout().daily_name(day());

    assert!(matches!(store.delete(&daily), Err(StoreError::Refused(_))));
    assert!(matches!(store.delete("missing.xlsx"), Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete("../x.xlsx"), Err(StoreError::InvalidName(_))));
    assert!(store.layout().daily_path(day()).exists());
}

#[test]
fn test_oversized_field_does_not_fail_submit() {
    let (store, _temp_dir) = open_store();

    let outcome = store
        .submit_on(day(), &receipt("A1", "B", &"x".repeat(40_000)))
        .unwrap();
    assert_eq!(outcome.row_count, 1);

    let rows = daily_rows(&store, day());
    assert_eq!(rows[0][2].chars().count(), 32_767);
}

#[test]
fn test_custom_field_set() {
    let temp_dir = TempDir::new().unwrap();
    let fields = FieldSet::parse(
        "voucher,delivery_station,delivery_date_with_weekday,more_instructions",
    )
    .unwrap();
    let store = AppendCoordinator::open(StoreLayout::new(temp_dir.path()), fields).unwrap();

    store
        .submit_on(
            day(),
            &Record::new()
                .with("voucher", "0099")
                .with("delivery_station", "Patras")
                .with("box", "dropped"),
        )
        .unwrap();

    assert_eq!(
        daily_rows(&store, day()),
        vec![vec!["0099", "Patras", "", ""]]
    );
}

#[test]
fn test_concurrent_submits_are_serialized() {
    let (store, _temp_dir) = open_store();
    let store = Arc::new(store);
    let threads = 8;
    let per_thread = 5;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..per_thread {
                    store
                        .submit_on(day(), &receipt(&format!("T{}-{}", t, i), "", ""))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let rows = daily_rows(&store, day());
    assert_eq!(rows.len(), threads * per_thread);

    // Each thread's rows keep their relative order
    for t in 0..threads {
        let own: Vec<&str> = rows
            .iter()
            .map(|row| row[0].as_str())
            .filter(|v| v.starts_with(&format!("T{}-", t)))
            .collect();
        let expected: Vec<String> = (0..per_thread).map(|i| format!("T{}-{}", t, i)).collect();
        assert_eq!(own, expected);
    }
}
