// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit-trail record types (spec.md §3): state log, proof log, action
//! dedup log, stale recovery log, and the (mostly out-of-scope) container
//! pool and routine-scheduler state.

use crate::batch::BatchId;
use crate::state::TaskState;
use crate::task::TaskId;
use serde::{Deserialize, Serialize};

/// Append-only history row: one per state transition (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateLogEntry {
    pub task_id: TaskId,
    pub from: TaskState,
    pub to: TaskState,
    pub reason: String,
    pub at_ms: i64,
}

/// Immutable audit record written on significant lifecycle transitions
/// (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofLogEntry {
    pub task_id: TaskId,
    pub event: String,
    pub stage: TaskState,
    pub decision: String,
    pub evidence: String,
    pub decision_maker: String,
    pub pr_url: Option<String>,
    pub duration_ms: Option<i64>,
    pub metadata: serde_json::Value,
    pub at_ms: i64,
}

/// Suppression status of a dedup-logged action (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionDedupStatus {
    Executed,
    DedupSuppressed,
}

crate::simple_display! {
    ActionDedupStatus {
        Executed => "executed",
        DedupSuppressed => "dedup_suppressed",
    }
}

/// One row of the rolling-window action dedup log (spec.md §3, §8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDedupEntry {
    pub cycle_id: String,
    pub action_type: String,
    pub target: String,
    pub status: ActionDedupStatus,
    /// Hash of the action's target state; a differing hash bypasses
    /// suppression even within the rolling window (spec.md §8).
    pub state_hash: String,
    pub at_ms: i64,
}

/// A force-transition-out-of-a-stale-state event (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleRecoveryEntry {
    pub task_id: TaskId,
    pub detecting_phase: String,
    pub from: TaskState,
    pub to: TaskState,
    pub stale_seconds: i64,
    pub root_cause: String,
    pub had_pr: bool,
    pub had_live_worker: bool,
    pub retries_at_recovery: u32,
    pub worker_completed_at_ms: Option<i64>,
    pub eval_started_at_ms: Option<i64>,
    pub eval_lag_seconds: Option<i64>,
    pub at_ms: i64,
}

/// Per-container health/cooldown bookkeeping (spec.md §3: "optional ...
/// out of scope for the minimum viable core"). The type exists so the
/// interface point is real; no scheduling logic consumes it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub name: String,
    pub healthy: bool,
    pub rate_limit_cooldown_until_ms: Option<i64>,
    pub last_dispatched_ms: Option<i64>,
}

/// Per-routine scheduler bookkeeping for periodic maintenance routines
/// (spec.md §3, §4.9.a).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutineState {
    pub name: String,
    pub run_count: u64,
    pub consecutive_zero_findings: u32,
    pub deferred_until_ms: Option<i64>,
}

/// Project-level signals that feed routine-scheduling decisions (spec.md
/// §4.9.a): count of critical open issues, and recent self-heal activity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectSignals {
    pub open_critical_issues: u32,
    pub recent_failure_count: u32,
}

/// Batch-completion deferral marker (spec.md §4.9 step 10): transitions
/// register the batch ID rather than running retrospectives/releases
/// inline; the pulse loop flushes each unique batch once at end-of-pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingBatchFlush(pub BatchId);

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
