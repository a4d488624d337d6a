// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backlog -> DB reconciliation decisions (spec.md §6 intake, §4.6 sanity
//! check items 1 and 4). Pure decision logic: given a backlog entry (or
//! its absence) and the current DB task (or its absence), decide what the
//! store should do. The caller executes the decision against [`sv_storage::Store`].

use sv_core::state::TaskState;
use sv_core::task::{Task, TaskId};

/// What the sync pass should do for one task ID, given the backlog line
/// and the DB row (either side may be absent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// No DB row exists for a backlog-declared task: create it `queued`.
    CreateFromBacklog,
    /// DB and backlog agree; nothing to do.
    NoOp,
    /// DB reports `failed`/`blocked` but the backlog still shows a claim
    /// by this host: strip the claim, and re-queue if retries remain
    /// (spec.md §4.6 item 1).
    StripStaleClaimAndRequeue,
    /// Strip the claim but leave the task in its current terminal state
    /// (retries exhausted).
    StripStaleClaimOnly,
    /// A non-terminal DB row has no matching backlog line: cancel it
    /// (spec.md §4.6 item 4, "DB orphan").
    CancelAsOrphan,
}

/// Decide the sync action for a task that exists in the DB.
///
/// `backlog_entry_present` / `claimed_by_this_host` describe the matching
/// backlog line, if any. `host` comparison is the caller's job; this
/// function only needs the boolean outcome.
pub fn decide_for_db_task(
    status: TaskState,
    retries_remaining: bool,
    backlog_entry_present: bool,
    claimed_by_this_host: bool,
) -> SyncAction {
    if !backlog_entry_present {
        if status.is_terminal_for_ordering() || status == TaskState::Queued {
            return SyncAction::NoOp;
        }
        return SyncAction::CancelAsOrphan;
    }

    let db_failed_with_claim = matches!(status, TaskState::Failed | TaskState::Blocked) && claimed_by_this_host;
    if db_failed_with_claim {
        return if retries_remaining {
            SyncAction::StripStaleClaimAndRequeue
        } else {
            SyncAction::StripStaleClaimOnly
        };
    }

    SyncAction::NoOp
}

/// Decide the sync action for a backlog line with no matching DB row.
pub fn decide_for_new_backlog_entry() -> SyncAction {
    SyncAction::CreateFromBacklog
}

/// Build a fresh [`Task`] for a backlog entry the DB has never seen,
/// honoring the `#auto-dispatch` tag and `model:` override (spec.md §6).
pub fn task_from_backlog(entry: &crate::entry::BacklogEntry, repo: std::path::PathBuf, created_at: i64) -> Task {
    Task {
        id: TaskId::new(&entry.id),
        repo,
        description: entry.title.clone(),
        status: TaskState::Queued,
        requested_tier: entry.model.as_deref().and_then(|m| m.parse().ok()),
        resolved_model: None,
        retries: 0,
        max_retries: 3,
        escalation_depth: 0,
        max_escalation: 2,
        session_handle: None,
        worktree_path: None,
        branch: None,
        log_path: None,
        pr_url: None,
        issue_url: entry.reference.clone(),
        diagnostic_of: None,
        last_failure_at: None,
        consecutive_failure_count: 0,
        prompt_repeat_done: false,
        pre_dispatch_main_sha: None,
        created_at,
        started_at: None,
        evaluating_started_at: None,
        completed_at: None,
        evaluation_duration_ms: None,
        batch_id: None,
        tags: entry.tags.clone(),
        blocked_by: entry.blocked_by.iter().map(|id| TaskId::new(id)).collect(),
        error_key: None,
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
