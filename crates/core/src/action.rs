// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure classification and self-heal action kinds (spec.md §4.5, §7).

use serde::{Deserialize, Serialize};

/// The three error-handling axes (spec.md §7 "kind"): whether a failure is
/// transient plumbing, a worker capability shortfall, or a hard policy
/// block that bypasses self-heal entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Infrastructure,
    Capability,
    Policy,
}

crate::simple_display! {
    FailureKind {
        Infrastructure => "infrastructure",
        Capability => "capability",
        Policy => "policy",
    }
}

/// Error-key prefixes that bypass self-heal and the retry budget entirely
/// (spec.md §4.5.1 non-retryable set, §7 policy axis). Matched against the
/// *normalized* error key (see [`normalize_error_key`]).
pub const NON_RETRYABLE_KEYS: &[&str] = &[
    "auth_error",
    "merge_conflict",
    "out_of_memory",
    "billing_credits_exhausted",
    "backend_quota_error",
    "backend_infrastructure_error",
    "max_retries",
];

/// Normalize a raw failure message/outcome label into the dedup-guard error
/// key: the prefix before the first colon (spec.md §4.7).
pub fn normalize_error_key(raw: &str) -> &str {
    raw.split_once(':').map(|(prefix, _)| prefix).unwrap_or(raw).trim()
}

/// True if `key` (already normalized, or not — this re-normalizes) is in the
/// non-retryable set and therefore ineligible for the prompt-repeat step.
pub fn is_non_retryable(key: &str) -> bool {
    let key = normalize_error_key(key);
    NON_RETRYABLE_KEYS.contains(&key)
}

/// Progressive self-heal strategies (spec.md §4.5), in escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PromptRepeat,
    Escalate,
    Diagnostic,
    /// No self-heal action is applicable; the task goes to its terminal
    /// failure state (`blocked` or `failed`) with a human-intervention note.
    Stop,
}

crate::simple_display! {
    ActionKind {
        PromptRepeat => "prompt_repeat",
        Escalate => "escalate",
        Diagnostic => "diagnostic",
        Stop => "stop",
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
