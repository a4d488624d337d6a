// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-heal (spec.md §4.5): three progressive strategies tried in order
//! on a failure outcome — prompt-repeat, model escalation, diagnostic
//! subtask. Decision logic is pure; the caller applies the resulting
//! [`SelfHealAction`] against the store.

use sv_core::action::{is_non_retryable, ActionKind};
use sv_core::outcome::OutcomeKind;
use sv_core::task::{ModelTier, Task, TaskId};

/// Whether a failure outcome reflects the worker's own capability limits
/// (escalate model tier) or a transient infrastructure problem (retry
/// unchanged) — spec.md §4.5 step 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureNature {
    Capability,
    Infrastructure,
}

/// Classify a failed outcome's nature (spec.md §4.5.2). Outcomes not listed
/// here never reach self-heal (policy hard-blocks) or are handled upstream
/// (successes).
pub fn classify_failure_nature(outcome: OutcomeKind) -> FailureNature {
    match outcome {
        OutcomeKind::RateLimited | OutcomeKind::QuotaError => FailureNature::Infrastructure,
        _ => FailureNature::Capability,
    }
}

/// Facts needed to pick the next self-heal action for one failed task
/// (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct SelfHealFacts {
    pub outcome: OutcomeKind,
    pub prompt_repeat_done: bool,
    pub current_tier: ModelTier,
    pub escalation_remaining: bool,
    pub retries_remaining: bool,
    /// `Some` if a live (non-terminal) diagnostic subtask already exists
    /// for this parent (spec.md §4.5.3 "at most one live diagnostic").
    pub existing_live_diagnostic: Option<TaskId>,
}

/// The chosen self-heal action, carrying what the caller needs to apply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfHealAction {
    PromptRepeat,
    Escalate(ModelTier),
    RequeueUnchanged,
    Diagnostic,
    Stop,
}

/// Pick the next self-heal action for a failed task (spec.md §4.5: the
/// three strategies are tried in order, each gated on its own conditions).
pub fn decide(facts: &SelfHealFacts) -> SelfHealAction {
    if facts.outcome.is_policy_hard_block() {
        return SelfHealAction::Stop;
    }

    let error_key = facts.outcome.to_string();
    if !facts.prompt_repeat_done && facts.retries_remaining && !is_non_retryable(&error_key) {
        return SelfHealAction::PromptRepeat;
    }

    match classify_failure_nature(facts.outcome) {
        FailureNature::Infrastructure => SelfHealAction::RequeueUnchanged,
        FailureNature::Capability => {
            if facts.escalation_remaining {
                if let Some(next) = facts.current_tier.escalate() {
                    return SelfHealAction::Escalate(next);
                }
            }
            if facts.existing_live_diagnostic.is_none() {
                SelfHealAction::Diagnostic
            } else {
                SelfHealAction::Stop
            }
        }
    }
}

impl SelfHealAction {
    /// The [`ActionKind`] this maps to for proof-log recording, `None` for
    /// `RequeueUnchanged` (recorded as a plain requeue, not a self-heal
    /// action).
    pub fn action_kind(&self) -> Option<ActionKind> {
        match self {
            SelfHealAction::PromptRepeat => Some(ActionKind::PromptRepeat),
            SelfHealAction::Escalate(_) => Some(ActionKind::Escalate),
            SelfHealAction::Diagnostic => Some(ActionKind::Diagnostic),
            SelfHealAction::Stop => Some(ActionKind::Stop),
            SelfHealAction::RequeueUnchanged => None,
        }
    }
}

const DIAGNOSTIC_LOG_TRUNCATE_BYTES: usize = 4 * 1024;

/// Build the description for a diagnostic subtask (spec.md §4.5.3): embeds
/// the truncated failure log and points back at the parent.
pub fn build_diagnostic_description(parent: &Task, failure_log_tail: &str) -> String {
    let truncated = if failure_log_tail.len() > DIAGNOSTIC_LOG_TRUNCATE_BYTES {
        let start = failure_log_tail.len() - DIAGNOSTIC_LOG_TRUNCATE_BYTES;
        &failure_log_tail[start..]
    } else {
        failure_log_tail
    };
    format!(
        "Diagnose why task {} failed repeatedly and fix the root cause.\n\
         Original task: {}\n\n\
         Failure log tail:\n{}",
        parent.id, parent.description, truncated
    )
}

/// The diagnostic subtask's ID: the parent's ID with a `-diag` suffix, kept
/// distinct from the dotted subtask-ordering convention so it never
/// participates in subtask-ordering gating.
pub fn diagnostic_task_id(parent: &TaskId) -> TaskId {
    TaskId::new(format!("{parent}-diag"))
}

/// Build the rebuilt prompt for a prompt-repeat dispatch (spec.md §4.5.1):
/// restates the task, names the previous failure mode, and appends a
/// completion checklist tailored to it.
pub fn build_prompt_repeat(task: &Task, previous_outcome: OutcomeKind, attempt: u32) -> String {
    format!(
        "{}\n\nYour previous attempt (retry {attempt}) ended with outcome `{previous_outcome}`. \
Before finishing, verify: the changes actually address the task description above, the test \
suite (if any) passes locally, and you emit FULL_LOOP_COMPLETE only once the PR is pushed.",
        task.description
    )
}

/// Session title suffix for a prompt-repeat dispatch (spec.md §4.5.1
/// "`-retry{n}` session title").
pub fn prompt_repeat_session_title(task_id: &TaskId, attempt: u32) -> String {
    format!("{task_id}-retry{attempt}")
}

#[cfg(test)]
#[path = "self_heal_tests.rs"]
mod tests;
