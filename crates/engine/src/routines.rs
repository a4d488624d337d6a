// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routine scheduling (spec.md §4.9.a): per-routine run/skip/defer
//! decision based on a minimum interval floor, a consecutive-zero-findings
//! streak, the open-critical-issues signal, and the recent-failure-rate
//! signal. Pure decision over [`sv_core::records::RoutineState`] and
//! [`sv_core::records::ProjectSignals`]; the caller persists the resulting
//! state and actually runs (or doesn't) the routine.

use sv_core::records::{ProjectSignals, RoutineState};
use std::time::Duration;

/// Whether a routine should run this pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineDecision {
    Run,
    /// Minimum interval floor not yet elapsed.
    SkipCooldown,
    /// Explicitly deferred until a later timestamp (backoff from a prior
    /// zero-findings streak, or a one-shot defer).
    Defer,
    /// Cosmetic routine deferred while critical work is queued or self-heal
    /// is busy.
    DeferForPriorityWork,
}

/// Per-routine configuration: how often it may run at most, how many
/// consecutive empty runs before backing off, and whether it's cosmetic
/// (deferrable under priority work) or load-bearing maintenance.
#[derive(Debug, Clone, Copy)]
pub struct RoutineConfig {
    pub min_interval: Duration,
    /// Consecutive zero-findings runs before the routine's interval is
    /// doubled (capped implicitly by the caller re-scheduling `deferred_until_ms`).
    pub zero_findings_backoff_threshold: u32,
    pub is_cosmetic: bool,
}

const CRITICAL_ISSUES_PAUSE_COSMETIC_THRESHOLD: u32 = 1;
const BUSY_SELF_HEAL_PAUSE_COSMETIC_THRESHOLD: u32 = 3;

/// Decide whether `routine` should run, given its own state, its
/// configuration, project-wide signals, and the current time.
pub fn decide(state: &RoutineState, config: &RoutineConfig, signals: &ProjectSignals, now_ms: i64, last_run_at_ms: Option<i64>) -> RoutineDecision {
    if let Some(deferred_until) = state.deferred_until_ms {
        if now_ms < deferred_until {
            return RoutineDecision::Defer;
        }
    }
    if let Some(last_run) = last_run_at_ms {
        if now_ms.saturating_sub(last_run) < config.min_interval.as_millis() as i64 {
            return RoutineDecision::SkipCooldown;
        }
    }
    if config.is_cosmetic {
        if signals.open_critical_issues >= CRITICAL_ISSUES_PAUSE_COSMETIC_THRESHOLD {
            return RoutineDecision::DeferForPriorityWork;
        }
        if signals.recent_failure_count >= BUSY_SELF_HEAL_PAUSE_COSMETIC_THRESHOLD {
            return RoutineDecision::DeferForPriorityWork;
        }
    }
    RoutineDecision::Run
}

/// Update a routine's bookkeeping after a run, per spec.md §4.9.a's
/// zero-findings streak: a run with findings resets the streak; an empty
/// run increments it and, once it crosses the backoff threshold, schedules
/// a deferral that roughly doubles the effective wait.
pub fn record_run(state: &RoutineState, config: &RoutineConfig, found_anything: bool, now_ms: i64) -> RoutineState {
    let mut next = state.clone();
    next.run_count += 1;
    if found_anything {
        next.consecutive_zero_findings = 0;
        next.deferred_until_ms = None;
        return next;
    }
    next.consecutive_zero_findings += 1;
    if next.consecutive_zero_findings >= config.zero_findings_backoff_threshold {
        next.deferred_until_ms = Some(now_ms + config.min_interval.as_millis() as i64);
    }
    next
}

#[cfg(test)]
#[path = "routines_tests.rs"]
mod tests;
