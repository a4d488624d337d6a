// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv dispatch <id> [--batch B]` (spec.md §4.3, §6): dedup guard, a bare
//! concurrency check, a provider-health probe, model resolution, and the
//! worker-script spawn. Exit codes per spec.md §6/§7: 0 ok, 1 hard fail, 2
//! at concurrency cap, 3 provider/cooldown defer.

use crate::context::Context;
use crate::exit_error::ExitError;
use crate::EX_TEMPFAIL;
use sv_adapters::llm::{select_cli, LlmCli, ProviderHealth};
use sv_adapters::process::{self, WorkerPaths};
use sv_adapters::worktree;
use sv_core::dedup::{self, DedupDecision};
use sv_core::state::TaskState;
use sv_core::task::{ModelTier, TaskId};
use sv_engine::dispatch::{
    decide_eligibility, resolve_model, worker_contract_preamble, EligibilityDecision, EligibilityFacts,
    ModelResolutionInput, ResolvedModel,
};

pub async fn run(ctx: &Context, id: &str, batch: Option<String>) -> anyhow::Result<()> {
    let task = super::require_task(&ctx.store, id)?;
    if task.status != TaskState::Queued {
        return Err(ExitError::new(1, format!("task {} is {}, not queued", task.id, task.status)).into());
    }

    let now_ms = ctx.now_ms();
    let cooldown_ms = ctx.env.config.failure_cooldown.as_millis() as i64;
    match dedup::decide(
        task.last_failure_at,
        task.consecutive_failure_count,
        now_ms,
        cooldown_ms,
        ctx.env.config.max_consecutive_failures,
    ) {
        DedupDecision::Proceed => {}
        DedupDecision::Cooldown => {
            return Err(ExitError::new(EX_TEMPFAIL, format!("{} is in dedup cooldown", task.id)).into());
        }
        DedupDecision::Block => {
            ctx.store.transition(
                &task.id,
                TaskState::Blocked,
                "Dispatch dedup guard: too many consecutive identical failures",
                now_ms,
                None,
            )?;
            return Err(ExitError::new(1, format!("{} blocked by dedup guard", task.id)).into());
        }
    }

    let running_count = ctx.store.list_tasks(Some(TaskState::Running))?.len() as u32;
    let tier = task.requested_tier.unwrap_or(ModelTier::Sonnet);
    let llm = select_cli(tier, ctx.env.config.prefer_oauth, ctx.env.config.cli_override.as_deref());
    let facts = EligibilityFacts {
        already_delivered: false,
        registered_repo: Some(task.repo.clone()),
        scanning_repo: task.repo.clone(),
        foreign_claim_active: false,
        running_count,
        concurrency_cap: ctx.env.config.max_concurrency,
        provider_health: llm.probe_health().await,
    };
    match decide_eligibility(&facts) {
        EligibilityDecision::Proceed => {}
        EligibilityDecision::DeferAtCapacity => {
            return Err(ExitError::new(2, format!("{} deferred: at concurrency cap", task.id)).into());
        }
        EligibilityDecision::Defer(ProviderHealth::Unavailable | ProviderHealth::RateLimited) => {
            return Err(ExitError::new(EX_TEMPFAIL, format!("{} deferred: provider unavailable", task.id)).into());
        }
        EligibilityDecision::BlockKeyInvalid => {
            ctx.store.transition(&task.id, TaskState::Blocked, "Provider API key invalid", now_ms, None)?;
            return Err(ExitError::new(1, format!("{} blocked: invalid provider key", task.id)).into());
        }
        other => {
            return Err(ExitError::new(1, format!("{} not eligible: {other:?}", task.id)).into());
        }
    }

    let resolved = resolve_model(&ModelResolutionInput { explicit: task.requested_tier, heuristic_tier: tier, ..Default::default() });
    let resolved_tier = match resolved {
        ResolvedModel::Tier(t) => t,
        ResolvedModel::Contest => tier,
    };

    spawn_worker(ctx, &task.id, resolved_tier, &task.description, task.issue_url.as_deref(), llm.as_ref(), batch).await
}

pub(crate) async fn spawn_worker(
    ctx: &Context,
    id: &TaskId,
    tier: ModelTier,
    description: &str,
    issue_url: Option<&str>,
    _llm: &dyn LlmCli,
    _batch: Option<String>,
) -> anyhow::Result<()> {
    let now_ms = ctx.now_ms();
    let scripts_dir = ctx.env.paths.scripts_dir();
    std::fs::create_dir_all(&scripts_dir)?;
    let worker_paths = WorkerPaths::new(&scripts_dir, id.as_str(), now_ms, None);

    let mut task = ctx.store.require_task(id)?;
    let branch = task.branch.clone().unwrap_or_else(|| worktree::default_branch_name(id.as_str()));
    let worktree_path = task.worktree_path.clone().unwrap_or_else(|| ctx.env.paths.worktrees_dir().join(id.as_str()));
    std::fs::create_dir_all(ctx.env.paths.worktrees_dir())?;
    worktree::acquire(&task.repo, &worktree_path, &branch).await?;

    let prompt = format!("{}{}", worker_contract_preamble(id, issue_url), description);
    let cli_args = vec!["--model".to_string(), tier.to_string(), "--output-format".to_string(), "json".to_string(), "-p".to_string(), prompt];
    sv_engine::dispatch::prepare_worker_scripts(&worker_paths, "claude", &cli_args, ctx.env.config.heartbeat_interval)?;

    let child = process::spawn_wrapper(&worker_paths.wrapper_script).await?;
    task.status = TaskState::Running;
    task.log_path = Some(worker_paths.log_file.clone());
    task.session_handle = child.id().map(|pid| pid.to_string());
    task.started_at = Some(now_ms);
    task.branch = Some(branch);
    task.worktree_path = Some(worktree_path);
    ctx.store.update_task(&task)?;
    ctx.store.transition(id, TaskState::Dispatched, "worker scripts written", now_ms, None)?;
    ctx.store.transition(id, TaskState::Running, "worker spawned", now_ms, None)?;

    println!("{id} dispatched (log: {})", worker_paths.log_file.display());
    Ok(())
}
