// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch engine (spec.md §4.3): candidate selection under fair,
//! adaptive concurrency; per-task eligibility; model resolution; worker
//! spawn. Selection and eligibility are pure functions over facts the
//! caller gathers (store reads, provider probes) — the same
//! facts-in/decision-out shape as [`sv_core::dedup::decide`] — so the
//! policy is unit-testable without a database or a live subprocess.

use sv_adapters::llm::ProviderHealth;
use sv_adapters::process::{self, ProcessError, WorkerPaths};
use sv_core::batch::Batch;
use sv_core::task::{ModelTier, Task, TaskId};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Up to `n` dispatch candidates from `queued`, applying fair cross-repo
/// interleaving (spec.md §4.3 "Selection", "Fair cross-repo
/// interleaving"). `queued` must already be filtered to
/// `status == Queued && retries < max_retries` with non-terminal dotted
/// siblings excluded (subtask ordering, spec.md §3 invariant (e)) — see
/// [`is_dispatchable_by_subtask_ordering`].
pub fn select_candidates<'a>(queued: &'a [Task], n: usize) -> Vec<&'a Task> {
    if n == 0 || queued.is_empty() {
        return Vec::new();
    }

    let mut by_repo: HashMap<&Path, Vec<&Task>> = HashMap::new();
    for task in queued {
        by_repo.entry(task.repo.as_path()).or_default().push(task);
    }
    for tasks in by_repo.values_mut() {
        tasks.sort_by(|a, b| a.retries.cmp(&b.retries).then(a.created_at.cmp(&b.created_at)));
    }

    let repos: Vec<&Path> = by_repo.keys().copied().collect();
    let total_queued: usize = queued.len();
    let mut quota: HashMap<&Path, usize> = HashMap::new();

    // Each repo gets one guaranteed slot first.
    let mut remaining = n;
    for repo in &repos {
        if remaining == 0 {
            break;
        }
        quota.insert(repo, 1);
        remaining -= 1;
    }

    // Remaining slots distributed proportional to each repo's queued
    // count, rounded up, capped at that repo's candidate count.
    for repo in &repos {
        if remaining == 0 {
            break;
        }
        let repo_count = by_repo[repo].len();
        let share = ((repo_count * remaining) as f64 / total_queued as f64).ceil() as usize;
        let already = quota.get(repo).copied().unwrap_or(0);
        let cap = repo_count.saturating_sub(already);
        let take = share.min(cap).min(remaining);
        *quota.entry(repo).or_default() += take;
        remaining -= take;
    }

    let mut selected = Vec::with_capacity(n);
    for repo in repos {
        let take = quota.get(&repo).copied().unwrap_or(0).min(by_repo[&repo].len());
        selected.extend(by_repo[&repo].iter().take(take));
    }
    selected.truncate(n);
    selected
}

/// True if `task` may be dispatched per subtask ordering (spec.md §3
/// invariant (e), §8): a dotted subtask `p.k` is dispatchable only once
/// every sibling `p.j` with `j < k` has reached a terminal state.
pub fn is_dispatchable_by_subtask_ordering(task: &Task, siblings: &[Task]) -> bool {
    let Some((parent, index)) = task.id.parent_and_index() else {
        return true;
    };
    siblings.iter().all(|s| {
        let Some((s_parent, s_index)) = s.id.parent_and_index() else { return true };
        s_parent != parent || s_index >= index || s.is_terminal_for_subtask_ordering()
    })
}

/// Adaptive concurrency cap (spec.md §4.3): `min(base × load_factor,
/// hard_cap)`, re-evaluated on every dispatch attempt.
pub fn effective_concurrency(batch: &Batch, machine_hard_cap: u32) -> u32 {
    let hard_cap = batch.effective_hard_cap(machine_hard_cap);
    let scaled = (batch.target_concurrency as f64 * batch.load_factor).floor() as u32;
    scaled.min(hard_cap)
}

/// Per-task eligibility decision (spec.md §4.3 steps 2-6; step 1 dedup
/// guard is [`sv_core::dedup::decide`], step 7 worktree acquisition is an
/// I/O concern handled by the caller after this returns `Proceed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EligibilityDecision {
    Proceed,
    /// Repo history or the backlog shows this task already delivered.
    CancelAlreadyDelivered,
    /// Task ID registered under a different repo than the one being scanned.
    SkipCrossRepoMisregistration,
    /// A foreign, non-stale backlog claim blocks this task.
    SkipForeignClaim,
    /// Running-task count at this scope is already at the concurrency cap.
    DeferAtCapacity,
    /// Provider is down, rate-limited, or the key is invalid.
    Defer(ProviderHealth),
    BlockKeyInvalid,
}

/// Facts needed to decide eligibility for one task (spec.md §4.3 steps 2-6).
#[derive(Debug, Clone)]
pub struct EligibilityFacts {
    pub already_delivered: bool,
    pub registered_repo: Option<std::path::PathBuf>,
    pub scanning_repo: std::path::PathBuf,
    pub foreign_claim_active: bool,
    pub running_count: u32,
    pub concurrency_cap: u32,
    pub provider_health: ProviderHealth,
}

pub fn decide_eligibility(facts: &EligibilityFacts) -> EligibilityDecision {
    if facts.already_delivered {
        return EligibilityDecision::CancelAlreadyDelivered;
    }
    if let Some(registered) = &facts.registered_repo {
        if registered != &facts.scanning_repo {
            return EligibilityDecision::SkipCrossRepoMisregistration;
        }
    }
    if facts.foreign_claim_active {
        return EligibilityDecision::SkipForeignClaim;
    }
    if facts.running_count >= facts.concurrency_cap {
        return EligibilityDecision::DeferAtCapacity;
    }
    match facts.provider_health {
        ProviderHealth::Healthy => EligibilityDecision::Proceed,
        ProviderHealth::KeyInvalid => EligibilityDecision::BlockKeyInvalid,
        other => EligibilityDecision::Defer(other),
    }
}

/// A stale backlog claim (spec.md §4.3 step 4: ">2h old, no live worker").
pub const STALE_CLAIM_AGE: Duration = Duration::from_secs(2 * 60 * 60);

pub fn is_stale_claim(claimed_at_ms: i64, now_ms: i64, worker_is_live: bool) -> bool {
    !worker_is_live && now_ms.saturating_sub(claimed_at_ms) > STALE_CLAIM_AGE.as_millis() as i64
}

/// Inputs to the model-resolution cascade (spec.md §4.3 "Model resolution").
/// Each stage is pre-computed by the caller (pattern-tracker / budget
/// lookups are out of this crate's I/O-free core); this function only
/// encodes the cascade order.
#[derive(Debug, Clone, Default)]
pub struct ModelResolutionInput {
    pub explicit: Option<ModelTier>,
    pub is_contest: bool,
    pub agent_def_pin: Option<ModelTier>,
    /// Cheaper-tier recommendation from the pattern tracker (≥3 samples,
    /// ≥75% success at that tier).
    pub pattern_tracker_tier: Option<ModelTier>,
    /// Cost-efficiency downgrade from opus to sonnet (≥3 samples, ≥80%
    /// success, no hard-opus indicators in the description).
    pub cost_efficiency_downgrade: bool,
    pub heuristic_tier: ModelTier,
    /// Budget-aware degrade when the provider's daily cap is near.
    pub budget_near_cap: bool,
}

/// Resolution outcome: either a resolved tier, or a signal that this task
/// needs the out-of-core contest dispatch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedModel {
    Tier(ModelTier),
    Contest,
}

pub fn resolve_model(input: &ModelResolutionInput) -> ResolvedModel {
    if let Some(tier) = input.explicit {
        return ResolvedModel::Tier(tier);
    }
    if input.is_contest {
        return ResolvedModel::Contest;
    }
    if let Some(tier) = input.agent_def_pin {
        return ResolvedModel::Tier(tier);
    }
    let mut tier = input.pattern_tracker_tier.unwrap_or(input.heuristic_tier);
    if input.cost_efficiency_downgrade && tier == ModelTier::Opus {
        tier = ModelTier::Sonnet;
    }
    if input.budget_near_cap {
        tier = tier.downgrade().unwrap_or(tier);
    }
    ResolvedModel::Tier(tier)
}

/// Render and write the dispatch/wrapper script pair for one worker spawn
/// (spec.md §4.3 "Worker spawn"), without starting the process.
pub fn prepare_worker_scripts(
    paths: &WorkerPaths,
    cli_binary: &str,
    cli_args: &[String],
    heartbeat_interval: Duration,
) -> Result<(), ProcessError> {
    let dispatch_body = process::render_dispatch_script(cli_binary, cli_args);
    let wrapper_body = process::render_wrapper_script(
        &paths.dispatch_script,
        &paths.log_file,
        &paths.pid_file,
        heartbeat_interval.as_secs(),
    );
    process::write_scripts(paths, &dispatch_body, &wrapper_body)
}

/// Build the worker's prompt contract preamble (spec.md §4.3 "The worker
/// receives, via the prompt, a contract"): the core never hands a worker a
/// bare task description without these non-negotiable terms.
pub fn worker_contract_preamble(task_id: &TaskId, issue_url: Option<&str>) -> String {
    let issue_line = issue_url
        .map(|u| format!("Embed this external-issue reference in the PR body: {u}\n"))
        .unwrap_or_default();
    format!(
        "You are executing task {task_id}. You may not modify the backlog file or its \
plan files — those are supervisor-owned. Report only via exit code, log output, and \
pull-request creation. Decompose into explicit subtasks, commit early, push and open a \
draft PR after your first commit, and run static checks on any shell-script changes \
before pushing. {issue_line}When the task is fully done, emit the line \
FULL_LOOP_COMPLETE as the final line of output.\n\n"
    )
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
