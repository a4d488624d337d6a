// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::batch::{Batch, BatchId, ReleaseType};
use sv_core::task::Task;

fn task(id: &str, repo: &str, retries: u32, created_at: i64) -> Task {
    let mut t = Task::test_queued(id, repo);
    t.retries = retries;
    t.created_at = created_at;
    t
}

#[test]
fn select_candidates_guarantees_one_slot_per_repo() {
    let tasks = vec![
        task("a1", "/repo-a", 0, 1),
        task("a2", "/repo-a", 0, 2),
        task("a3", "/repo-a", 0, 3),
        task("b1", "/repo-b", 0, 1),
    ];
    let selected = select_candidates(&tasks, 2);
    let repos: std::collections::HashSet<_> = selected.iter().map(|t| t.repo.clone()).collect();
    assert!(repos.contains(std::path::Path::new("/repo-a")));
    assert!(repos.contains(std::path::Path::new("/repo-b")));
}

#[test]
fn select_candidates_orders_within_repo_by_retries_then_created_at() {
    let tasks = vec![task("a1", "/repo", 1, 5), task("a2", "/repo", 0, 10)];
    let selected = select_candidates(&tasks, 1);
    assert_eq!(selected[0].id.as_str(), "a2");
}

#[test]
fn select_candidates_caps_at_n() {
    let tasks = vec![task("a1", "/repo", 0, 1), task("a2", "/repo", 0, 2), task("a3", "/repo", 0, 3)];
    assert_eq!(select_candidates(&tasks, 2).len(), 2);
}

#[test]
fn subtask_ordering_blocks_until_earlier_siblings_terminal() {
    let p2 = task("t400.2", "/repo", 0, 1);
    let mut p1 = task("t400.1", "/repo", 0, 1);
    p1.status = sv_core::state::TaskState::Running;
    assert!(!is_dispatchable_by_subtask_ordering(&p2, std::slice::from_ref(&p1)));
    p1.status = sv_core::state::TaskState::Complete;
    assert!(is_dispatchable_by_subtask_ordering(&p2, std::slice::from_ref(&p1)));
}

#[test]
fn subtask_ordering_ignores_top_level_tasks() {
    let t = task("t500", "/repo", 0, 1);
    assert!(is_dispatchable_by_subtask_ordering(&t, &[]));
}

#[test]
fn effective_concurrency_scales_with_load_factor() {
    let mut batch = Batch::new(BatchId::new(), "b");
    batch.target_concurrency = 4;
    batch.load_factor = 0.5;
    assert_eq!(effective_concurrency(&batch, 10), 2);
}

#[test]
fn effective_concurrency_respects_batch_hard_cap() {
    let mut batch = Batch::new(BatchId::new(), "b");
    batch.target_concurrency = 10;
    batch.load_factor = 1.0;
    batch.max_concurrency = 3;
    assert_eq!(effective_concurrency(&batch, 100), 3);
}

fn healthy_facts() -> EligibilityFacts {
    EligibilityFacts {
        already_delivered: false,
        registered_repo: None,
        scanning_repo: std::path::PathBuf::from("/repo"),
        foreign_claim_active: false,
        running_count: 0,
        concurrency_cap: 4,
        provider_health: ProviderHealth::Healthy,
    }
}

#[test]
fn eligibility_proceeds_when_everything_is_clear() {
    assert_eq!(decide_eligibility(&healthy_facts()), EligibilityDecision::Proceed);
}

#[test]
fn eligibility_cancels_already_delivered_tasks() {
    let mut facts = healthy_facts();
    facts.already_delivered = true;
    assert_eq!(decide_eligibility(&facts), EligibilityDecision::CancelAlreadyDelivered);
}

#[test]
fn eligibility_skips_cross_repo_misregistration() {
    let mut facts = healthy_facts();
    facts.registered_repo = Some(std::path::PathBuf::from("/other-repo"));
    assert_eq!(decide_eligibility(&facts), EligibilityDecision::SkipCrossRepoMisregistration);
}

#[test]
fn eligibility_skips_foreign_claims() {
    let mut facts = healthy_facts();
    facts.foreign_claim_active = true;
    assert_eq!(decide_eligibility(&facts), EligibilityDecision::SkipForeignClaim);
}

#[test]
fn eligibility_defers_at_capacity() {
    let mut facts = healthy_facts();
    facts.running_count = 4;
    assert_eq!(decide_eligibility(&facts), EligibilityDecision::DeferAtCapacity);
}

#[test]
fn eligibility_blocks_on_invalid_key() {
    let mut facts = healthy_facts();
    facts.provider_health = ProviderHealth::KeyInvalid;
    assert_eq!(decide_eligibility(&facts), EligibilityDecision::BlockKeyInvalid);
}

#[test]
fn eligibility_defers_on_rate_limit() {
    let mut facts = healthy_facts();
    facts.provider_health = ProviderHealth::RateLimited;
    assert_eq!(decide_eligibility(&facts), EligibilityDecision::Defer(ProviderHealth::RateLimited));
}

#[test]
fn stale_claim_detection_requires_no_live_worker() {
    assert!(is_stale_claim(0, 3 * 60 * 60 * 1000, false));
    assert!(!is_stale_claim(0, 3 * 60 * 60 * 1000, true));
    assert!(!is_stale_claim(0, 60 * 1000, false));
}

#[test]
fn model_resolution_explicit_overrides_everything() {
    let input = ModelResolutionInput { explicit: Some(ModelTier::Haiku), is_contest: true, ..Default::default() };
    assert_eq!(resolve_model(&input), ResolvedModel::Tier(ModelTier::Haiku));
}

#[test]
fn model_resolution_falls_through_to_contest() {
    let input = ModelResolutionInput { is_contest: true, ..Default::default() };
    assert_eq!(resolve_model(&input), ResolvedModel::Contest);
}

#[test]
fn model_resolution_honors_agent_def_pin() {
    let input = ModelResolutionInput { agent_def_pin: Some(ModelTier::Sonnet), ..Default::default() };
    assert_eq!(resolve_model(&input), ResolvedModel::Tier(ModelTier::Sonnet));
}

#[test]
fn model_resolution_downgrades_opus_on_cost_efficiency() {
    let input = ModelResolutionInput {
        pattern_tracker_tier: Some(ModelTier::Opus),
        cost_efficiency_downgrade: true,
        heuristic_tier: ModelTier::Opus,
        ..Default::default()
    };
    assert_eq!(resolve_model(&input), ResolvedModel::Tier(ModelTier::Sonnet));
}

#[test]
fn model_resolution_degrades_tier_when_budget_is_near_cap() {
    let input = ModelResolutionInput {
        heuristic_tier: ModelTier::Sonnet,
        budget_near_cap: true,
        ..Default::default()
    };
    assert_eq!(resolve_model(&input), ResolvedModel::Tier(ModelTier::Haiku));
}

#[test]
fn worker_contract_preamble_embeds_issue_reference() {
    let id = sv_core::task::TaskId::new("t1");
    let preamble = worker_contract_preamble(&id, Some("https://example.com/issues/1"));
    assert!(preamble.contains("https://example.com/issues/1"));
    assert!(preamble.contains("FULL_LOOP_COMPLETE"));
}
