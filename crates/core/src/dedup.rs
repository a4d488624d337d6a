// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dedup-guard decision logic (spec.md §4.3 step 1, §4.7).
//!
//! The guard's bookkeeping (`last_failure_at`, `consecutive_failure_count`,
//! `error_key`) lives on [`crate::task::Task`]; this module holds the pure
//! decision function and the update-on-failure/clear-on-success rules so
//! they can be unit tested without a database.

use serde::{Deserialize, Serialize};

/// Outcome of the pre-dispatch dedup check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupDecision {
    /// No recent matching failure in cooldown; dispatch may proceed.
    Proceed,
    /// Within the cooldown window but under the consecutive-failure
    /// threshold: defer dispatch, leave the task `queued`.
    Cooldown,
    /// Within the cooldown window and at/over the consecutive-failure
    /// threshold: transition the task to `blocked`.
    Block,
}

/// Decide dispatch eligibility from dedup-guard state (spec.md §4.3 step 1).
///
/// `last_failure_at_ms` / `now_ms` are epoch milliseconds. `cooldown_ms` is
/// the configured cooldown window (`SUPERVISOR_FAILURE_COOLDOWN_SECS`,
/// default 600s). `max_consecutive` is
/// `SUPERVISOR_MAX_CONSECUTIVE_FAILURES` (default 2).
pub fn decide(
    last_failure_at_ms: Option<i64>,
    consecutive_failure_count: u32,
    now_ms: i64,
    cooldown_ms: i64,
    max_consecutive: u32,
) -> DedupDecision {
    let Some(last_failure_at_ms) = last_failure_at_ms else {
        return DedupDecision::Proceed;
    };
    let elapsed = now_ms.saturating_sub(last_failure_at_ms);
    if elapsed >= cooldown_ms {
        return DedupDecision::Proceed;
    }
    if consecutive_failure_count >= max_consecutive {
        DedupDecision::Block
    } else {
        DedupDecision::Cooldown
    }
}

/// Apply the on-failure update rule (spec.md §4.7): increment the
/// consecutive-failure counter when the normalized error key matches the
/// previous one, otherwise reset to 1 (new failure mode).
///
/// Returns `(new_count, new_error_key)`.
pub fn next_consecutive_count(
    previous_error_key: Option<&str>,
    previous_count: u32,
    new_error_key: &str,
) -> (u32, String) {
    let new_key = crate::action::normalize_error_key(new_error_key).to_string();
    let count =
        if previous_error_key == Some(new_key.as_str()) { previous_count + 1 } else { 1 };
    (count, new_key)
}

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;
