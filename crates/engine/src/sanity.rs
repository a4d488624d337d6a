// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sanity check, Phase 0.9 (spec.md §4.6): runs only when the queue is
//! stalled (zero dispatchable tasks despite open tasks). Items 1
//! (DB-failed-with-claim) and 4 (DB orphans) are the store-facing
//! [`sv_backlog::sync::SyncAction`] decisions applied per task; this module
//! adds items 2 (failed-blocker chains) and 3 (missing dispatch tag), plus
//! the stall breakdown emitted when no fixes are found.

use sv_backlog::entry::{BacklogEntry, ClassificationHint};
use sv_core::state::TaskState;
use sv_core::task::TaskId;

/// Decision for one `blocked-by` dependency of an open task (spec.md §4.6
/// item 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockerAction {
    NoOp,
    /// The blocking dependency is `failed` with retries remaining: reset it
    /// to `queued` so the chain can unstick on its own.
    ResetBlocker(TaskId),
    /// The blocking dependency's retries are exhausted: remove it from the
    /// dependent's `blocked_by` list instead.
    UnblockDependent(TaskId),
}

/// One blocking dependency's state, as the caller looked it up in the store.
#[derive(Debug, Clone, Copy)]
pub struct BlockerFacts {
    pub blocker_id: TaskId,
    pub blocker_status: TaskState,
    pub blocker_retries_remaining: bool,
}

pub fn decide_blocker_action(facts: &BlockerFacts) -> BlockerAction {
    if facts.blocker_status != TaskState::Failed {
        return BlockerAction::NoOp;
    }
    if facts.blocker_retries_remaining {
        BlockerAction::ResetBlocker(facts.blocker_id.clone())
    } else {
        BlockerAction::UnblockDependent(facts.blocker_id.clone())
    }
}

/// Walk every `blocked_by` entry of one open, non-terminal task and decide
/// what (if anything) to do about each.
pub fn decide_blocker_actions(open_task_blockers: &[BlockerFacts]) -> Vec<BlockerAction> {
    open_task_blockers.iter().map(decide_blocker_action).collect()
}

/// True if a backlog entry looks dispatchable but is missing the
/// `#auto-dispatch` tag (spec.md §4.6 item 3: "model assigned, time
/// estimate present, no blocker tags, no `blocked-by`, no claim, not a plan
/// or investigation").
pub fn looks_dispatchable_but_untagged(entry: &BacklogEntry) -> bool {
    if entry.auto_dispatch() {
        return false;
    }
    if entry.model.is_none() || entry.time_estimate.is_none() {
        return false;
    }
    if !entry.blocked_by.is_empty() || entry.is_claimed() {
        return false;
    }
    !entry
        .classification_hints()
        .iter()
        .any(|h| matches!(h, ClassificationHint::Plan | ClassificationHint::Investigation))
}

/// A structured breakdown of why the queue is stalled, emitted when the
/// sanity check finds zero fixes to apply (spec.md §4.6 closing paragraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StallBreakdown {
    pub open_count: u32,
    pub claimed: u32,
    pub blocked: u32,
    pub missing_tag: u32,
    pub db_failed: u32,
}

impl StallBreakdown {
    pub fn is_dead_queue(&self) -> bool {
        self.open_count > 0
    }
}

/// Total fixes applied by the sanity pass, one counter per item (spec.md
/// §4.6: "each returns a count of fixes applied").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SanityFixCounts {
    pub db_failed_with_claim: u32,
    pub failed_blocker_chains: u32,
    pub missing_dispatch_tag: u32,
    pub db_orphans: u32,
}

impl SanityFixCounts {
    pub fn total(&self) -> u32 {
        self.db_failed_with_claim + self.failed_blocker_chains + self.missing_dispatch_tag + self.db_orphans
    }
}

#[cfg(test)]
#[path = "sanity_tests.rs"]
mod tests;
