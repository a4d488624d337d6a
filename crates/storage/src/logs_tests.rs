// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::conn::open_in_memory;
use crate::schema::apply_schema;
use crate::tasks::insert_task;
use sv_core::state::TaskState;
use sv_core::task::Task;

fn setup() -> Connection {
    let conn = open_in_memory().expect("open");
    apply_schema(&conn).expect("schema");
    insert_task(&conn, &Task::test_queued("t1", "/repos/example")).expect("seed task");
    conn
}

fn proof(task_id: &str, at_ms: i64) -> ProofLogEntry {
    ProofLogEntry {
        task_id: TaskId::new(task_id),
        event: "dispatched".into(),
        stage: TaskState::Dispatched,
        decision: "dispatch".into(),
        evidence: "session started".into(),
        decision_maker: "dispatch_engine".into(),
        pr_url: None,
        duration_ms: None,
        metadata: serde_json::json!({"attempt": 1}),
        at_ms,
    }
}

#[test]
fn append_and_list_proof_log_preserves_order() {
    let conn = setup();
    append_proof(&conn, &proof("t1", 1)).expect("append 1");
    append_proof(&conn, &proof("t1", 2)).expect("append 2");

    let entries = proof_log_for_task(&conn, &TaskId::new("t1")).expect("list");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].at_ms, 1);
    assert_eq!(entries[1].at_ms, 2);
    assert_eq!(entries[0].metadata, serde_json::json!({"attempt": 1}));
}

fn dedup_entry(target: &str, state_hash: &str, status: ActionDedupStatus, at_ms: i64) -> ActionDedupEntry {
    ActionDedupEntry {
        cycle_id: "cycle-1".into(),
        action_type: "prompt_repeat".into(),
        target: target.into(),
        status,
        state_hash: state_hash.into(),
        at_ms,
    }
}

#[test]
fn identical_action_within_window_is_detected() {
    let conn = setup();
    record_action_dedup(&conn, &dedup_entry("t1", "h1", ActionDedupStatus::Executed, 1_000)).expect("record");

    assert!(was_recently_executed(&conn, "prompt_repeat", "t1", "h1", 1_500, 10_000).expect("query"));
}

#[test]
fn differing_state_hash_bypasses_suppression() {
    let conn = setup();
    record_action_dedup(&conn, &dedup_entry("t1", "h1", ActionDedupStatus::Executed, 1_000)).expect("record");

    assert!(!was_recently_executed(&conn, "prompt_repeat", "t1", "h2", 1_500, 10_000).expect("query"));
}

#[test]
fn suppressed_entries_do_not_count_as_recently_executed() {
    let conn = setup();
    record_action_dedup(&conn, &dedup_entry("t1", "h1", ActionDedupStatus::DedupSuppressed, 1_000)).expect("record");

    assert!(!was_recently_executed(&conn, "prompt_repeat", "t1", "h1", 1_500, 10_000).expect("query"));
}

#[test]
fn outside_window_is_not_recently_executed() {
    let conn = setup();
    record_action_dedup(&conn, &dedup_entry("t1", "h1", ActionDedupStatus::Executed, 1_000)).expect("record");

    assert!(!was_recently_executed(&conn, "prompt_repeat", "t1", "h1", 20_000, 5_000).expect("query"));
}

#[test]
fn stale_recovery_log_round_trips() {
    let conn = setup();
    let entry = StaleRecoveryEntry {
        task_id: TaskId::new("t1"),
        detecting_phase: "sanity_check".into(),
        from: TaskState::Running,
        to: TaskState::Queued,
        stale_seconds: 7_200,
        root_cause: "worker process gone, no PR, no recent heartbeat".into(),
        had_pr: false,
        had_live_worker: false,
        retries_at_recovery: 1,
        worker_completed_at_ms: None,
        eval_started_at_ms: None,
        eval_lag_seconds: None,
        at_ms: 42,
    };
    append_stale_recovery(&conn, &entry).expect("append");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM stale_recovery_log WHERE task_id = 't1'", [], |r| r.get(0))
        .expect("count");
    assert_eq!(count, 1);
}
