// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::conn::open_in_memory;
use crate::schema::apply_schema;
use sv_core::state::TaskState;

fn setup() -> Connection {
    let conn = open_in_memory().expect("open");
    apply_schema(&conn).expect("schema");
    conn
}

#[test]
fn insert_and_get_round_trips() {
    let conn = setup();
    let mut task = Task::test_queued("t100", "/repos/example");
    task.tags = vec!["infra".into(), "p1".into()];
    task.created_at = 1_700_000_000_000;
    insert_task(&conn, &task).expect("insert");

    let fetched = get_task(&conn, &task.id).expect("get").expect("present");
    assert_eq!(fetched, task);
}

#[test]
fn missing_task_returns_none() {
    let conn = setup();
    assert_eq!(get_task(&conn, &TaskId::new("nope")).unwrap(), None);
}

#[test]
fn transition_updates_status_and_appends_state_log() {
    let conn = setup();
    let task = Task::test_queued("t200", "/repos/example");
    insert_task(&conn, &task).expect("insert");

    let updated = transition(&conn, &task.id, TaskState::Dispatched, "dispatch engine selected task", 42, None)
        .expect("transition");
    assert_eq!(updated.status, TaskState::Dispatched);

    let logged: String =
        conn.query_row("SELECT to_state FROM state_log WHERE task_id = ?1", params![task.id.as_str()], |r| r.get(0))
            .expect("state log row");
    assert_eq!(logged, "dispatched");
}

#[test]
fn transition_rejects_illegal_edge() {
    let conn = setup();
    let task = Task::test_queued("t300", "/repos/example");
    insert_task(&conn, &task).expect("insert");

    let err = transition(&conn, &task.id, TaskState::Deployed, "skip ahead", 1, None).unwrap_err();
    assert!(matches!(err, StorageError::IllegalTransition(_)));
}

#[test]
fn list_subtasks_finds_only_dotted_children() {
    let conn = setup();
    insert_task(&conn, &Task::test_queued("t400", "/repos/example")).expect("insert parent");
    insert_task(&conn, &Task::test_queued("t400.1", "/repos/example")).expect("insert child 1");
    insert_task(&conn, &Task::test_queued("t400.2", "/repos/example")).expect("insert child 2");
    insert_task(&conn, &Task::test_queued("t4001", "/repos/example")).expect("insert unrelated");

    let subtasks = list_subtasks(&conn, &TaskId::new("t400")).expect("list");
    let ids: Vec<String> = subtasks.iter().map(|t| t.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["t400.1", "t400.2"]);
}

#[test]
fn update_task_persists_mutated_fields() {
    let conn = setup();
    let mut task = Task::test_queued("t500", "/repos/example");
    insert_task(&conn, &task).expect("insert");

    task.retries = 1;
    task.error_key = Some("timeout".into());
    task.blocked_by = vec![TaskId::new("t100")];
    update_task(&conn, &task).expect("update");

    let fetched = get_task(&conn, &task.id).expect("get").expect("present");
    assert_eq!(fetched.retries, 1);
    assert_eq!(fetched.error_key.as_deref(), Some("timeout"));
    assert_eq!(fetched.blocked_by, vec![TaskId::new("t100")]);
}
