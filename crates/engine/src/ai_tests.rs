// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::self_heal::SelfHealFacts;
use sv_core::outcome::OutcomeKind;
use sv_core::task::Task;

fn facts() -> SelfHealFacts {
    SelfHealFacts {
        outcome: OutcomeKind::WorkInProgress,
        prompt_repeat_done: true,
        current_tier: ModelTier::Sonnet,
        escalation_remaining: true,
        retries_remaining: true,
        existing_live_diagnostic: None,
    }
}

#[tokio::test]
async fn deterministic_advisor_classifies_by_static_rule() {
    let task = Task::test_queued("t1", "/repo");
    let advice = DeterministicAdvisor.advise(&task, &facts(), "some log").await;
    assert_eq!(advice.nature, FailureNature::Capability);
    assert!(advice.diagnostic_description.is_some());
}

#[test]
fn parse_nature_verdict_recognizes_both_labels() {
    assert_eq!(parse_nature_verdict("capability"), Some(FailureNature::Capability));
    assert_eq!(parse_nature_verdict("Infrastructure.\n"), Some(FailureNature::Infrastructure));
    assert_eq!(parse_nature_verdict("I don't know"), None);
}

#[test]
fn apply_advice_overrides_escalation_when_advisor_says_infrastructure() {
    let f = facts();
    let advice = HealAdvice { nature: FailureNature::Infrastructure, diagnostic_description: None };
    assert_eq!(apply_advice(&f, &advice), SelfHealAction::RequeueUnchanged);
}

#[test]
fn apply_advice_keeps_deterministic_decision_when_advisor_agrees() {
    let f = facts();
    let advice = HealAdvice { nature: FailureNature::Capability, diagnostic_description: None };
    assert_eq!(apply_advice(&f, &advice), self_heal::decide(&f));
}
