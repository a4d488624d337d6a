// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn seed_db(path: &Path) {
    std::fs::write(path, b"sqlite-bytes").expect("seed db file");
}

#[test]
fn backup_copies_and_latest_finds_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("db.sqlite3");
    seed_db(&db);
    let backups = dir.path().join("backups");

    let path = take_backup(&db, &backups, 1_700_000_000_000).expect("backup");
    assert!(path.is_file());
    assert_eq!(latest_backup(&backups).unwrap().unwrap(), path);
}

#[test]
fn prune_keeps_only_most_recent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("db.sqlite3");
    seed_db(&db);
    let backups = dir.path().join("backups");

    for i in 0..(KEEP_BACKUPS + 3) {
        take_backup(&db, &backups, 1_700_000_000_000 + i as i64).expect("backup");
    }
    let remaining = std::fs::read_dir(&backups).unwrap().count();
    assert_eq!(remaining, KEEP_BACKUPS);
    // The newest backup must survive pruning.
    let newest = latest_backup(&backups).unwrap().unwrap();
    assert!(newest.to_string_lossy().contains(&(1_700_000_000_000 + KEEP_BACKUPS as i64 + 2).to_string()));
}

#[test]
fn restore_latest_overwrites_live_db() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("db.sqlite3");
    seed_db(&db);
    let backups = dir.path().join("backups");
    take_backup(&db, &backups, 1).expect("backup");

    std::fs::write(&db, b"corrupted").expect("corrupt live db");
    restore_latest(&db, &backups).expect("restore").expect("a backup existed");
    assert_eq!(std::fs::read(&db).unwrap(), b"sqlite-bytes");
}

#[test]
fn restore_with_no_backups_is_a_noop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("db.sqlite3");
    seed_db(&db);
    let backups = dir.path().join("backups");
    assert_eq!(restore_latest(&db, &backups).unwrap(), None);
}
