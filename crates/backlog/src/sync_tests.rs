// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::entry::BacklogEntry;

#[test]
fn missing_db_row_creates_from_backlog() {
    assert_eq!(decide_for_new_backlog_entry(), SyncAction::CreateFromBacklog);
}

#[test]
fn terminal_status_with_no_backlog_line_is_left_alone() {
    assert_eq!(decide_for_db_task(TaskState::Deployed, false, false, false), SyncAction::NoOp);
    assert_eq!(decide_for_db_task(TaskState::Queued, true, false, false), SyncAction::NoOp);
}

#[test]
fn non_terminal_orphan_is_cancelled() {
    assert_eq!(decide_for_db_task(TaskState::Running, true, false, false), SyncAction::CancelAsOrphan);
}

#[test]
fn failed_with_claim_and_retries_requeues() {
    assert_eq!(
        decide_for_db_task(TaskState::Failed, true, true, true),
        SyncAction::StripStaleClaimAndRequeue
    );
}

#[test]
fn failed_with_claim_and_no_retries_only_strips_claim() {
    assert_eq!(
        decide_for_db_task(TaskState::Failed, false, true, true),
        SyncAction::StripStaleClaimOnly
    );
}

#[test]
fn failed_claimed_by_other_host_is_left_alone() {
    assert_eq!(decide_for_db_task(TaskState::Failed, true, true, false), SyncAction::NoOp);
}

#[test]
fn task_from_backlog_carries_fields_through() {
    let entry = BacklogEntry {
        id: "t900".into(),
        title: "Write docs".into(),
        tags: vec!["auto-dispatch".into()],
        blocked_by: vec!["t800".into()],
        model: Some("sonnet".into()),
        reference: Some("GH#12".into()),
        ..Default::default()
    };
    let task = task_from_backlog(&entry, "/repos/x".into(), 100);
    assert_eq!(task.id.as_str(), "t900");
    assert_eq!(task.description, "Write docs");
    assert_eq!(task.status, TaskState::Queued);
    assert_eq!(task.blocked_by, vec![TaskId::new("t800")]);
    assert_eq!(task.requested_tier, Some(sv_core::task::ModelTier::Sonnet));
    assert_eq!(task.issue_url.as_deref(), Some("GH#12"));
}
