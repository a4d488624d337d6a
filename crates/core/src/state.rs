// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task lifecycle state machine (spec.md §4.2).
//!
//! Validation is table-driven: [`legal_successors`] returns the edges out of
//! a state, and [`validate_transition`] rejects anything not in that list,
//! returning the legal successors so callers can report a useful error.
//! Guard predicates (`complete -> deployed` requiring a merged PR, and the
//! reset guard blocking re-queue of already-delivered work) are pure
//! functions here; the caller (the store) supplies the external facts
//! (upstream PR state, delivery history) since this crate has no I/O.

use serde::{Deserialize, Serialize};

/// The closed set of task lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    Dispatched,
    Running,
    Evaluating,
    Retrying,
    Complete,
    PrReview,
    ReviewTriage,
    Merging,
    Merged,
    Deploying,
    Deployed,
    Verifying,
    Verified,
    VerifyFailed,
    Blocked,
    Failed,
    Cancelled,
}

crate::simple_display! {
    TaskState {
        Queued => "queued",
        Dispatched => "dispatched",
        Running => "running",
        Evaluating => "evaluating",
        Retrying => "retrying",
        Complete => "complete",
        PrReview => "pr_review",
        ReviewTriage => "review_triage",
        Merging => "merging",
        Merged => "merged",
        Deploying => "deploying",
        Deployed => "deployed",
        Verifying => "verifying",
        Verified => "verified",
        VerifyFailed => "verify_failed",
        Blocked => "blocked",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use TaskState::*;
        Ok(match s {
            "queued" => Queued,
            "dispatched" => Dispatched,
            "running" => Running,
            "evaluating" => Evaluating,
            "retrying" => Retrying,
            "complete" => Complete,
            "pr_review" => PrReview,
            "review_triage" => ReviewTriage,
            "merging" => Merging,
            "merged" => Merged,
            "deploying" => Deploying,
            "deployed" => Deployed,
            "verifying" => Verifying,
            "verified" => Verified,
            "verify_failed" => VerifyFailed,
            "blocked" => Blocked,
            "failed" => Failed,
            "cancelled" => Cancelled,
            other => return Err(format!("unknown task state: {other}")),
        })
    }
}

impl TaskState {
    /// Administrative-reset-eligible terminal-ish states (spec.md §4.2:
    /// `{blocked, failed, cancelled, complete} -> queued`).
    pub const RESETTABLE: &'static [TaskState] =
        &[TaskState::Blocked, TaskState::Failed, TaskState::Cancelled, TaskState::Complete];

    /// States from which the task is considered terminal for subtask
    /// ordering purposes (spec.md §3 invariant (e), §8).
    pub fn is_terminal_for_ordering(self) -> bool {
        matches!(
            self,
            TaskState::Verified
                | TaskState::Cancelled
                | TaskState::Deployed
                | TaskState::Complete
                | TaskState::Failed
                | TaskState::Blocked
        )
    }

    /// True if this state can be cancelled from (all states except
    /// `Cancelled` itself — cancellation is idempotent, spec.md §5).
    pub fn can_cancel(self) -> bool {
        self != TaskState::Cancelled
    }
}

/// The edges out of `from`, per spec.md §4.2's transition DAG.
pub fn legal_successors(from: TaskState) -> &'static [TaskState] {
    use TaskState::*;
    match from {
        Queued => &[Dispatched, Cancelled],
        Dispatched => &[Running, Cancelled],
        Running => &[Evaluating, Cancelled],
        Evaluating => &[Complete, Retrying, Blocked, Failed, Cancelled],
        Retrying => &[Dispatched, Cancelled],
        Complete => &[PrReview, Queued, Cancelled],
        PrReview => &[ReviewTriage, Cancelled],
        ReviewTriage => &[Merging, Cancelled],
        Merging => &[Merged, Cancelled],
        Merged => &[Deploying, Cancelled],
        Deploying => &[Deployed, Cancelled],
        Deployed => &[Verifying, Cancelled],
        Verifying => &[Verified, VerifyFailed, Cancelled],
        Verified => &[Cancelled],
        VerifyFailed => &[Cancelled],
        Blocked => &[Queued, Cancelled],
        Failed => &[Queued, Cancelled],
        Cancelled => &[Queued],
    }
}

/// An illegal transition, carrying the legal successors for error reporting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("illegal transition {from} -> {to}; legal successors: {legal:?}")]
pub struct IllegalTransition {
    pub from: TaskState,
    pub to: TaskState,
    pub legal: Vec<TaskState>,
}

/// Validate a bare state-table transition (no guards). Same-state
/// transitions are always rejected — `transition(x, S); transition(x, S)`
/// is refused on the second call (spec.md §8 idempotence law).
pub fn validate_transition(from: TaskState, to: TaskState) -> Result<(), IllegalTransition> {
    let legal = legal_successors(from);
    if legal.contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to, legal: legal.to_vec() })
    }
}

/// A transition blocked by a semantic guard rather than the bare table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("cannot transition to deployed: PR {pr_url} is not merged upstream")]
    PrNotMerged { pr_url: String },
    #[error("cannot reset task: upstream history shows this task ID as already delivered")]
    AlreadyDelivered,
}

/// Guard: `* -> deployed` requires either no real PR URL, or a merged
/// upstream PR (spec.md §4.2 "Guard: complete→deployed", §8 testable
/// property). `pr_url` is `None` when the task has no PR or only a
/// synthetic sentinel.
pub fn check_deployed_guard(pr_url: Option<&str>, upstream_merged: bool) -> Result<(), GuardError> {
    match pr_url {
        Some(url) if !upstream_merged => {
            Err(GuardError::PrNotMerged { pr_url: url.to_string() })
        }
        _ => Ok(()),
    }
}

/// Guard: administrative reset (`{blocked,failed,cancelled,complete} ->
/// queued`) is refused when repo history or the backlog shows this task ID
/// as already delivered via a merged PR (spec.md §4.2 "Guard: reset").
pub fn check_reset_guard(already_delivered: bool) -> Result<(), GuardError> {
    if already_delivered {
        Err(GuardError::AlreadyDelivered)
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
