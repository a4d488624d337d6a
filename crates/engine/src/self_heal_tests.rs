// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::task::TaskId;

fn facts() -> SelfHealFacts {
    SelfHealFacts {
        outcome: OutcomeKind::WorkInProgress,
        prompt_repeat_done: false,
        current_tier: ModelTier::Haiku,
        escalation_remaining: true,
        retries_remaining: true,
        existing_live_diagnostic: None,
    }
}

#[test]
fn policy_hard_block_always_stops() {
    let mut f = facts();
    f.outcome = OutcomeKind::AuthError;
    assert_eq!(decide(&f), SelfHealAction::Stop);
}

#[test]
fn first_failure_tries_prompt_repeat() {
    assert_eq!(decide(&facts()), SelfHealAction::PromptRepeat);
}

#[test]
fn prompt_repeat_not_retried_twice() {
    let mut f = facts();
    f.prompt_repeat_done = true;
    assert_eq!(decide(&f), SelfHealAction::Escalate(ModelTier::Sonnet));
}

#[test]
fn non_retryable_outcome_skips_prompt_repeat() {
    let mut f = facts();
    f.outcome = OutcomeKind::CleanExitNoSignal;
    f.prompt_repeat_done = false;
    // CleanExitNoSignal isn't in the non-retryable set, so prompt-repeat still applies.
    assert_eq!(decide(&f), SelfHealAction::PromptRepeat);
}

#[test]
fn infrastructure_failure_requeues_unchanged_after_prompt_repeat_used() {
    let mut f = facts();
    f.prompt_repeat_done = true;
    f.outcome = OutcomeKind::RateLimited;
    assert_eq!(decide(&f), SelfHealAction::RequeueUnchanged);
}

#[test]
fn capability_failure_escalates_when_budget_allows() {
    let mut f = facts();
    f.prompt_repeat_done = true;
    f.current_tier = ModelTier::Sonnet;
    assert_eq!(decide(&f), SelfHealAction::Escalate(ModelTier::Opus));
}

#[test]
fn capability_failure_at_top_tier_creates_diagnostic() {
    let mut f = facts();
    f.prompt_repeat_done = true;
    f.current_tier = ModelTier::Opus;
    assert_eq!(decide(&f), SelfHealAction::Diagnostic);
}

#[test]
fn capability_failure_stops_when_escalation_budget_exhausted() {
    let mut f = facts();
    f.prompt_repeat_done = true;
    f.escalation_remaining = false;
    assert_eq!(decide(&f), SelfHealAction::Diagnostic);
}

#[test]
fn existing_live_diagnostic_blocks_a_second_one() {
    let mut f = facts();
    f.prompt_repeat_done = true;
    f.current_tier = ModelTier::Opus;
    f.existing_live_diagnostic = Some(TaskId::new("t1-diag"));
    assert_eq!(decide(&f), SelfHealAction::Stop);
}

#[test]
fn diagnostic_description_embeds_truncated_log_and_parent_description() {
    let parent = Task::test_queued("t1", "/repo");
    let desc = build_diagnostic_description(&parent, "some failure log");
    assert!(desc.contains("t1"));
    assert!(desc.contains("some failure log"));
}

#[test]
fn diagnostic_description_truncates_long_logs() {
    let parent = Task::test_queued("t1", "/repo");
    let long_log = "x".repeat(DIAGNOSTIC_LOG_TRUNCATE_BYTES * 2);
    let desc = build_diagnostic_description(&parent, &long_log);
    assert!(desc.len() < long_log.len());
}

#[test]
fn diagnostic_task_id_has_diag_suffix() {
    assert_eq!(diagnostic_task_id(&TaskId::new("t1")).as_str(), "t1-diag");
}

#[test]
fn prompt_repeat_session_title_includes_attempt_number() {
    assert_eq!(prompt_repeat_session_title(&TaskId::new("t1"), 2), "t1-retry2");
}
