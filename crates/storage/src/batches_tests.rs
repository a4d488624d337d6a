// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::conn::open_in_memory;
use crate::schema::apply_schema;

fn setup() -> Connection {
    let conn = open_in_memory().expect("open");
    apply_schema(&conn).expect("schema");
    conn
}

#[test]
fn insert_and_get_round_trips() {
    let conn = setup();
    let mut batch = Batch::new(BatchId::new(), "release train");
    batch.max_concurrency = 6;
    batch.release_on_completion = true;
    insert_batch(&conn, &batch).expect("insert");

    let fetched = get_batch(&conn, &batch.id).expect("get").expect("present");
    assert_eq!(fetched, batch);
}

#[test]
fn missing_batch_returns_none() {
    let conn = setup();
    assert_eq!(get_batch(&conn, &BatchId::new()).unwrap(), None);
}

#[test]
fn require_batch_errors_when_missing() {
    let conn = setup();
    let id = BatchId::new();
    let err = require_batch(&conn, &id).unwrap_err();
    assert!(matches!(err, StorageError::BatchNotFound(found) if found == id.as_str()));
}
