// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::task::Task;

#[test]
fn open_in_memory_applies_schema() {
    let store = Store::open_in_memory().expect("open");
    assert_eq!(store.list_tasks(None).expect("list"), Vec::new());
}

#[test]
fn insert_and_transition_through_the_facade() {
    let store = Store::open_in_memory().expect("open");
    let task = Task::test_queued("t1", "/repos/example");
    store.insert_task(&task).expect("insert");

    let updated = store.transition(&task.id, TaskState::Dispatched, "dispatch", 1, None).expect("transition");
    assert_eq!(updated.status, TaskState::Dispatched);
    assert_eq!(store.require_task(&task.id).expect("require").status, TaskState::Dispatched);
}

#[test]
fn in_memory_backup_is_a_noop() {
    let store = Store::open_in_memory().expect("open");
    assert_eq!(store.backup(1).expect("backup"), None);
}

#[test]
fn open_on_disk_round_trips_and_reopens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_file = dir.path().join("sv.sqlite3");
    let backups = dir.path().join("backups");

    {
        let store = Store::open(&db_file, &backups).expect("open");
        store.insert_task(&Task::test_queued("t1", "/repos/example")).expect("insert");
    }

    let store = Store::open(&db_file, &backups).expect("reopen");
    assert!(store.get_task(&TaskId::new("t1")).expect("get").is_some());
}

#[test]
fn backup_writes_a_file_under_backup_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_file = dir.path().join("sv.sqlite3");
    let backups = dir.path().join("backups");
    let store = Store::open(&db_file, &backups).expect("open");

    let path = store.backup(1_700_000_000_000).expect("backup").expect("some path");
    assert!(path.is_file());
}
