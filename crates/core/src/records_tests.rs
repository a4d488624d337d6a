// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn action_dedup_status_displays_snake_case() {
    assert_eq!(ActionDedupStatus::Executed.to_string(), "executed");
    assert_eq!(ActionDedupStatus::DedupSuppressed.to_string(), "dedup_suppressed");
}

#[test]
fn routine_state_defaults_to_never_run() {
    let r = RoutineState::default();
    assert_eq!(r.run_count, 0);
    assert_eq!(r.consecutive_zero_findings, 0);
    assert!(r.deferred_until_ms.is_none());
}

#[test]
fn state_log_entry_round_trips_through_json() {
    let entry = StateLogEntry {
        task_id: TaskId::from("t400.2"),
        from: TaskState::Running,
        to: TaskState::Evaluating,
        reason: "worker exited cleanly".into(),
        at_ms: 42,
    };
    let json = serde_json::to_string(&entry).expect("serialize");
    let back: StateLogEntry = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(entry, back);
}

#[test]
fn proof_log_entry_allows_missing_pr_and_duration() {
    let entry = ProofLogEntry {
        task_id: TaskId::from("t1"),
        event: "dispatched".into(),
        stage: TaskState::Dispatched,
        decision: "dispatch".into(),
        evidence: "session started".into(),
        decision_maker: "dispatch_engine".into(),
        pr_url: None,
        duration_ms: None,
        metadata: serde_json::json!({}),
        at_ms: 1,
    };
    let json = serde_json::to_string(&entry).expect("serialize");
    let back: ProofLogEntry = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(entry, back);
}
