// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker outcome classification (spec.md §4.4).

use serde::{Deserialize, Serialize};

/// The discrete outcome the evaluator classifies a finished worker into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Complete,
    CompleteNoPr,
    WorkInProgress,
    TrivialOutput,
    CleanExitNoSignal,
    WorkerNeverStarted,
    Timeout,
    AuthError,
    QuotaError,
    RateLimited,
    MergeConflict,
    OutOfMemory,
    WorkerDispatchError,
    VerifyComplete,
    VerifyIncomplete,
    VerifyNotStarted,
}

crate::simple_display! {
    OutcomeKind {
        Complete => "complete",
        CompleteNoPr => "complete_no_pr",
        WorkInProgress => "work_in_progress",
        TrivialOutput => "trivial_output",
        CleanExitNoSignal => "clean_exit_no_signal",
        WorkerNeverStarted => "worker_never_started",
        Timeout => "timeout",
        AuthError => "auth_error",
        QuotaError => "quota_error",
        RateLimited => "rate_limited",
        MergeConflict => "merge_conflict",
        OutOfMemory => "out_of_memory",
        WorkerDispatchError => "worker_dispatch_error",
        VerifyComplete => "verify_complete",
        VerifyIncomplete => "verify_incomplete",
        VerifyNotStarted => "verify_not_started",
    }
}

impl OutcomeKind {
    /// True for outcomes that represent a successful terminal classification
    /// (as opposed to a failure the self-heal / error-handling paths act on).
    pub fn is_success(self) -> bool {
        matches!(self, OutcomeKind::Complete | OutcomeKind::VerifyComplete)
    }

    /// Non-retryable policy-kind outcomes (spec.md §4.5.1, §7): self-heal's
    /// prompt-repeat step is gated on the failure reason NOT being in this
    /// set, and these outcomes bypass self-heal entirely, going straight to
    /// `blocked`/`failed` with a human-intervention note.
    pub fn is_policy_hard_block(self) -> bool {
        matches!(
            self,
            OutcomeKind::AuthError
                | OutcomeKind::MergeConflict
                | OutcomeKind::OutOfMemory
                | OutcomeKind::QuotaError
        )
    }

    /// Transient infrastructure outcomes: handled locally (defer / retry
    /// unchanged), never counted against the retry budget (spec.md §7).
    /// Quota/credit exhaustion is a policy hard-block, not infrastructure
    /// (spec.md §7) — it never recovers on its own the way a rate limit
    /// does, so it is excluded here.
    pub fn is_infrastructure(self) -> bool {
        matches!(self, OutcomeKind::RateLimited)
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
