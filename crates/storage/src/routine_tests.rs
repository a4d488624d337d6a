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
fn unknown_routine_defaults_to_never_run() {
    let conn = setup();
    let state = get_routine_state(&conn, "dependency_audit").expect("get");
    assert_eq!(state.name, "dependency_audit");
    assert_eq!(state.run_count, 0);
}

#[test]
fn upsert_then_get_round_trips() {
    let conn = setup();
    let state = RoutineState {
        name: "dependency_audit".into(),
        run_count: 4,
        consecutive_zero_findings: 2,
        deferred_until_ms: Some(9_000),
    };
    upsert_routine_state(&conn, &state).expect("upsert");
    assert_eq!(get_routine_state(&conn, "dependency_audit").expect("get"), state);
}

#[test]
fn upsert_overwrites_existing_row() {
    let conn = setup();
    upsert_routine_state(&conn, &RoutineState { name: "r".into(), run_count: 1, ..Default::default() })
        .expect("first upsert");
    upsert_routine_state(&conn, &RoutineState { name: "r".into(), run_count: 2, ..Default::default() })
        .expect("second upsert");
    assert_eq!(get_routine_state(&conn, "r").expect("get").run_count, 2);
}
