// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    queued_to_dispatched = { TaskState::Queued, TaskState::Dispatched, true },
    dispatched_to_running = { TaskState::Dispatched, TaskState::Running, true },
    running_to_evaluating = { TaskState::Running, TaskState::Evaluating, true },
    evaluating_to_complete = { TaskState::Evaluating, TaskState::Complete, true },
    evaluating_to_retrying = { TaskState::Evaluating, TaskState::Retrying, true },
    evaluating_to_blocked = { TaskState::Evaluating, TaskState::Blocked, true },
    evaluating_to_failed = { TaskState::Evaluating, TaskState::Failed, true },
    retrying_to_dispatched = { TaskState::Retrying, TaskState::Dispatched, true },
    complete_to_pr_review = { TaskState::Complete, TaskState::PrReview, true },
    pr_review_to_review_triage = { TaskState::PrReview, TaskState::ReviewTriage, true },
    review_triage_to_merging = { TaskState::ReviewTriage, TaskState::Merging, true },
    merging_to_merged = { TaskState::Merging, TaskState::Merged, true },
    merged_to_deploying = { TaskState::Merged, TaskState::Deploying, true },
    deploying_to_deployed = { TaskState::Deploying, TaskState::Deployed, true },
    deployed_to_verifying = { TaskState::Deployed, TaskState::Verifying, true },
    verifying_to_verified = { TaskState::Verifying, TaskState::Verified, true },
    verifying_to_verify_failed = { TaskState::Verifying, TaskState::VerifyFailed, true },
    blocked_to_queued = { TaskState::Blocked, TaskState::Queued, true },
    failed_to_queued = { TaskState::Failed, TaskState::Queued, true },
    cancelled_to_queued = { TaskState::Cancelled, TaskState::Queued, true },
    complete_to_queued = { TaskState::Complete, TaskState::Queued, true },
    any_to_cancelled = { TaskState::Running, TaskState::Cancelled, true },
    queued_to_running_illegal = { TaskState::Queued, TaskState::Running, false },
    complete_to_deployed_direct_illegal = { TaskState::Complete, TaskState::Deployed, false },
    verified_to_queued_illegal = { TaskState::Verified, TaskState::Queued, false },
)]
fn transition_table_matches_spec(from: TaskState, to: TaskState, expect_ok: bool) {
    assert_eq!(validate_transition(from, to).is_ok(), expect_ok);
}

#[test]
fn same_state_transition_is_always_refused() {
    for state in [
        TaskState::Queued,
        TaskState::Dispatched,
        TaskState::Running,
        TaskState::Evaluating,
        TaskState::Complete,
        TaskState::Deployed,
        TaskState::Verified,
        TaskState::Cancelled,
    ] {
        assert!(validate_transition(state, state).is_err(), "{state} -> {state} should be refused");
    }
}

#[test]
fn illegal_transition_reports_legal_successors() {
    let err = validate_transition(TaskState::Queued, TaskState::Verified).unwrap_err();
    assert_eq!(err.legal, vec![TaskState::Dispatched, TaskState::Cancelled]);
}

#[test]
fn deployed_guard_allows_task_with_no_pr() {
    assert!(check_deployed_guard(None, false).is_ok());
}

#[test]
fn deployed_guard_blocks_unmerged_real_pr() {
    let err = check_deployed_guard(Some("https://github.com/acme/repo/pull/9"), false).unwrap_err();
    assert_eq!(
        err,
        GuardError::PrNotMerged { pr_url: "https://github.com/acme/repo/pull/9".to_string() }
    );
}

#[test]
fn deployed_guard_allows_merged_real_pr() {
    assert!(check_deployed_guard(Some("https://github.com/acme/repo/pull/9"), true).is_ok());
}

#[test]
fn reset_guard_blocks_already_delivered_task() {
    assert_eq!(check_reset_guard(true).unwrap_err(), GuardError::AlreadyDelivered);
    assert!(check_reset_guard(false).is_ok());
}

#[test]
fn state_round_trips_through_display_and_from_str() {
    for state in [
        TaskState::Queued,
        TaskState::PrReview,
        TaskState::ReviewTriage,
        TaskState::VerifyFailed,
        TaskState::Cancelled,
    ] {
        let s = state.to_string();
        assert_eq!(s.parse::<TaskState>().unwrap(), state);
    }
}

#[test]
fn is_terminal_for_ordering_matches_spec_set() {
    assert!(TaskState::Verified.is_terminal_for_ordering());
    assert!(TaskState::Cancelled.is_terminal_for_ordering());
    assert!(TaskState::Deployed.is_terminal_for_ordering());
    assert!(TaskState::Complete.is_terminal_for_ordering());
    assert!(TaskState::Failed.is_terminal_for_ordering());
    assert!(TaskState::Blocked.is_terminal_for_ordering());
    assert!(!TaskState::Running.is_terminal_for_ordering());
    assert!(!TaskState::Queued.is_terminal_for_ordering());
}
