// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv pulse [--batch B]` / `sv watch [--repo R]` (spec.md §4.9, §6): the
//! ten-step pulse loop. [`sv_engine::pulse::run_pulse`] owns steps 5-8;
//! this module supplies the steps that need the CLI's store/backlog/
//! process access — backlog reconciliation and sanity check, worker
//! evaluation, self-heal, circuit-breaker bookkeeping, actual dispatch,
//! and reporting.

use super::dispatch;
use super::self_heal;
use crate::context::Context;
use nix::sys::signal::Signal;
use sv_adapters::process;
use sv_backlog::{entry::BacklogEntry, sync, sync::SyncAction, writer};
use sv_core::dedup;
use sv_core::state::TaskState;
use sv_core::task::{Task, TaskId, ModelTier};
use sv_engine::dispatch::{is_dispatchable_by_subtask_ordering, select_candidates};
use sv_engine::evaluator::evaluate;
use sv_engine::pulse::{run_pulse, NoopAdvancer, PulseReport};
use sv_engine::sanity::{self, BlockerAction, BlockerFacts, SanityFixCounts};
use sv_adapters::llm::select_cli;
use std::path::{Path, PathBuf};

pub async fn run_once(ctx: &Context, batch: Option<String>) -> anyhow::Result<()> {
    let report = tick(ctx, batch).await?;
    println!(
        "evaluated={} self_healed={} dispatched={} advanced={} breaker_tripped={}",
        report.evaluated, report.self_healed, report.dispatched, report.circuit_breaker_tripped
    );
    Ok(())
}

pub async fn watch(ctx: &Context, repo: Option<String>, interval_secs: u64) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match tick(ctx, repo.clone()).await {
                    Ok(report) => println!(
                        "pulse: evaluated={} self_healed={} dispatched={}",
                        report.evaluated, report.self_healed, report.dispatched
                    ),
                    Err(e) => eprintln!("pulse tick failed: {e:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("watch stopped");
                return Ok(());
            }
        }
    }
}

/// The backlog file a repo's tasks are declared in (spec.md §1 non-goal:
/// "the text-format of the backlog file beyond the fields the core
/// reads" — the filename itself is this supervisor's own convention).
fn backlog_file(repo: &Path) -> PathBuf {
    repo.join("BACKLOG.md")
}

/// One full pulse tick: reconcile the backlog (step 1), sanity-check a
/// stalled queue (step 2), evaluate running workers (steps 3-4 +
/// self-heal), then actual dispatch (steps 6-7 via reusing
/// [`dispatch::run`]), then the pipeline-advance/circuit-breaker
/// bookkeeping [`run_pulse`] owns.
async fn tick(ctx: &Context, batch: Option<String>) -> anyhow::Result<PulseReport> {
    let reconciled = reconcile_backlog(ctx).await?;
    let sanity_fixes = run_sanity_check(ctx).await?;

    let evaluated = evaluate_running(ctx).await?;

    let advancer = NoopAdvancer;
    let llm = select_cli(ModelTier::Sonnet, ctx.env.config.prefer_oauth, ctx.env.config.cli_override.as_deref());
    let mut report = run_pulse(&ctx.env, &ctx.store, &advancer, &ctx.forge, llm.as_ref())
        .await
        .map_err(|e| anyhow::anyhow!("pulse: {e}"))?;
    report.reconciled = reconciled;
    report.sanity_fixes = sanity_fixes;
    report.evaluated = evaluated.0;
    report.self_healed = evaluated.1;

    if !report.circuit_breaker_tripped {
        report.dispatched = dispatch_ready(ctx, batch).await?;
    }
    Ok(report)
}

/// Step 1: create a DB task for every backlog entry that doesn't have one
/// yet (spec.md §4.9 step 1 "backlog-file -> DB"). Runs unconditionally,
/// every pulse — unlike the stale-claim/orphan cleanup in
/// [`run_sanity_check`], which only fires when the queue is stalled.
async fn reconcile_backlog(ctx: &Context) -> anyhow::Result<u32> {
    let mut reconciled = 0;
    for repo in distinct_repos(ctx)? {
        let Some(entries) = read_backlog(&repo) else { continue };
        for entry in &entries {
            if ctx.store.get_task(&TaskId::new(&entry.id))?.is_some() {
                continue;
            }
            if sync::decide_for_new_backlog_entry() == SyncAction::CreateFromBacklog {
                let task = sync::task_from_backlog(entry, repo.clone(), ctx.now_ms());
                ctx.store.insert_task(&task)?;
                reconciled += 1;
            }
        }
    }
    Ok(reconciled)
}

/// Step 2 (spec.md §4.6): only runs when the queue is stalled — open
/// tasks exist but none are currently dispatchable. Applies stale-claim
/// release / orphan cancellation (sync-decision items 1 and 4) plus
/// failed-blocker-chain and missing-dispatch-tag fixes (sanity items 2
/// and 3).
async fn run_sanity_check(ctx: &Context) -> anyhow::Result<SanityFixCounts> {
    let all_tasks = ctx.store.list_tasks(None)?;
    let open: Vec<&Task> = all_tasks.iter().filter(|t| !t.status.is_terminal_for_ordering()).collect();
    if open.is_empty() {
        return Ok(SanityFixCounts::default());
    }
    let queued = ctx.store.list_tasks(Some(TaskState::Queued))?;
    let dispatchable = queued.iter().filter(|t| is_dispatchable_by_subtask_ordering(t, &all_tasks)).count();
    if dispatchable > 0 {
        return Ok(SanityFixCounts::default());
    }

    let mut counts = SanityFixCounts::default();
    let now_ms = ctx.now_ms();

    for repo in distinct_repos(ctx)? {
        let Some(entries) = read_backlog(&repo) else { continue };
        let by_id: std::collections::HashMap<&str, &BacklogEntry> =
            entries.iter().map(|e| (e.id.as_str(), e)).collect();

        for task in all_tasks.iter().filter(|t| t.repo == repo && !t.status.is_terminal_for_ordering()) {
            let entry = by_id.get(task.id.as_str()).copied();
            let action = sync::decide_for_db_task(
                task.status,
                task.retries_remaining(),
                entry.is_some(),
                entry.is_some_and(|e| e.is_claimed()),
            );
            match action {
                SyncAction::StripStaleClaimAndRequeue => {
                    let path = backlog_file(&repo);
                    let _ = writer::apply_to_file(&path, |text| writer::strip_claim(text, task.id.as_str()));
                    ctx.store.transition(&task.id, TaskState::Queued, "sanity check: stale claim stripped, requeued", now_ms, None)?;
                    counts.db_failed_with_claim += 1;
                }
                SyncAction::StripStaleClaimOnly => {
                    let path = backlog_file(&repo);
                    let _ = writer::apply_to_file(&path, |text| writer::strip_claim(text, task.id.as_str()));
                    counts.db_failed_with_claim += 1;
                }
                SyncAction::CancelAsOrphan => {
                    ctx.store.transition(&task.id, TaskState::Cancelled, "DB orphan", now_ms, None)?;
                    counts.db_orphans += 1;
                }
                SyncAction::CreateFromBacklog | SyncAction::NoOp => {}
            }
        }

        // Item 2: failed-blocker chains.
        for task in all_tasks.iter().filter(|t| t.repo == repo && !t.status.is_terminal_for_ordering() && !t.blocked_by.is_empty()) {
            let facts: Vec<BlockerFacts> = task
                .blocked_by
                .iter()
                .filter_map(|blocker_id| ctx.store.get_task(blocker_id).ok().flatten())
                .map(|blocker| BlockerFacts {
                    blocker_id: blocker.id.clone(),
                    blocker_status: blocker.status,
                    blocker_retries_remaining: blocker.retries_remaining(),
                })
                .collect();
            for action in sanity::decide_blocker_actions(&facts) {
                match action {
                    BlockerAction::ResetBlocker(id) => {
                        ctx.store.transition(&id, TaskState::Queued, "sanity check: unstick failed blocker", now_ms, None)?;
                        counts.failed_blocker_chains += 1;
                    }
                    BlockerAction::UnblockDependent(id) => {
                        let mut updated = task.clone();
                        updated.blocked_by.retain(|b| b != &id);
                        ctx.store.update_task(&updated)?;
                        counts.failed_blocker_chains += 1;
                    }
                    BlockerAction::NoOp => {}
                }
            }
        }

        // Item 3: dispatchable-but-untagged backlog entries.
        for entry in entries.iter().filter(|e| sanity::looks_dispatchable_but_untagged(e)) {
            let path = backlog_file(&repo);
            if writer::apply_to_file(&path, |text| writer::add_tag(text, &entry.id, "auto-dispatch")).unwrap_or(false) {
                counts.missing_dispatch_tag += 1;
            }
        }
    }

    Ok(counts)
}

fn distinct_repos(ctx: &Context) -> anyhow::Result<Vec<PathBuf>> {
    let mut repos: Vec<PathBuf> = ctx.store.list_tasks(None)?.into_iter().map(|t| t.repo).collect();
    repos.sort();
    repos.dedup();
    Ok(repos)
}

fn read_backlog(repo: &Path) -> Option<Vec<BacklogEntry>> {
    let text = std::fs::read_to_string(backlog_file(repo)).ok()?;
    Some(sv_backlog::parser::parse_backlog(&text))
}

/// Steps 3-4: for every `running` task whose worker log shows it has
/// exited (an `EXIT:` sentinel present) or whose wrapper has gone
/// silent past its hung timeout, classify the outcome and apply
/// self-heal / dedup / circuit-breaker bookkeeping.
async fn evaluate_running(ctx: &Context) -> anyhow::Result<(u32, u32)> {
    let mut evaluated = 0;
    let mut healed = 0;
    let breaker_path = ctx.env.paths.circuit_breaker_file();

    for task in ctx.store.list_tasks(Some(TaskState::Running))? {
        let Some(log_path) = &task.log_path else { continue };
        let raw = tokio::fs::read_to_string(log_path).await.unwrap_or_default();
        let sentinels = sv_engine::evaluator::parse_log(&raw);
        let now_ms = ctx.now_ms();

        let hang_detected = if sentinels.exit_code.is_none() && !sentinels.full_loop_complete {
            let last_activity_ms = last_activity_at_ms(log_path).await.unwrap_or_else(|| task.started_at.unwrap_or(now_ms));
            if !process::is_hung(last_activity_ms, now_ms, process::hung_timeout(None)) {
                continue;
            }
            signal_hung_worker(&task);
            true
        } else {
            false
        };

        ctx.store.transition(&task.id, TaskState::Evaluating, "worker exited, evaluating", now_ms, None)?;

        let (outcome, _) = evaluate(log_path, &task.repo, false, hang_detected, &ctx.forge).await?;
        evaluated += 1;

        let mut updated = task.clone();
        if outcome.is_success() {
            updated.consecutive_failure_count = 0;
            updated.error_key = None;
        } else {
            let (count, key) =
                dedup::next_consecutive_count(task.error_key.as_deref(), task.consecutive_failure_count, &outcome.to_string());
            updated.consecutive_failure_count = count;
            updated.error_key = Some(key);
            updated.last_failure_at = Some(now_ms);
        }
        ctx.store.update_task(&updated)?;

        if outcome.is_success() {
            ctx.store.transition(&task.id, TaskState::Complete, &format!("pulse evaluation: {outcome}"), now_ms, None)?;
            ctx.store.transition(&task.id, TaskState::PrReview, "complete, awaiting PR review", now_ms, None)?;
            circuit_breaker_on_success(ctx, &breaker_path, &task).await?;
        } else {
            ctx.store.transition(&task.id, TaskState::Failed, &format!("pulse evaluation: {outcome}"), now_ms, None)?;
            if self_heal::run(ctx, task.id.as_str()).await.is_ok() {
                healed += 1;
            }
            if !outcome.is_policy_hard_block() {
                circuit_breaker_on_failure(ctx, &breaker_path, &task, now_ms).await?;
            }
        }
    }
    Ok((evaluated, healed))
}

/// Item 8 (spec.md §4.8): auto-trip the breaker once consecutive task
/// failures reach the configured threshold. Policy hard-blocks (quota
/// exhaustion etc.) don't count toward the trip — they already halt the
/// individual task for human intervention.
async fn circuit_breaker_on_failure(
    ctx: &Context,
    breaker_path: &Path,
    task: &Task,
    now_ms: i64,
) -> anyhow::Result<()> {
    let state = sv_engine::circuit_breaker::record_failure(
        breaker_path,
        now_ms,
        ctx.env.config.circuit_breaker_threshold,
        ctx.env.config.circuit_breaker_cooldown,
    )?;
    if state.tripped_at_ms == Some(now_ms) {
        sv_engine::circuit_breaker::announce_trip(&ctx.forge, &task.repo, ctx.env.config.circuit_breaker_threshold).await;
    }
    Ok(())
}

async fn circuit_breaker_on_success(ctx: &Context, breaker_path: &Path, task: &Task) -> anyhow::Result<()> {
    sv_engine::circuit_breaker::reset(breaker_path)?;
    sv_engine::circuit_breaker::announce_reset(&ctx.forge, &task.repo).await;
    Ok(())
}

async fn last_activity_at_ms(log_path: &Path) -> Option<i64> {
    let meta = tokio::fs::metadata(log_path).await.ok()?;
    let modified = meta.modified().ok()?;
    let since_epoch = modified.duration_since(std::time::UNIX_EPOCH).ok()?;
    Some(since_epoch.as_millis() as i64)
}

/// Best-effort: a hung wrapper gets `SIGTERM`'d so its own EXIT trap reaps
/// the descendant process tree (spec.md §4.3 "Heartbeat and hang
/// detection").
fn signal_hung_worker(task: &Task) {
    let Some(handle) = &task.session_handle else { return };
    let Ok(pid) = handle.parse::<i32>() else { return };
    if let Err(e) = process::signal_wrapper(pid, Signal::SIGTERM) {
        tracing::warn!(task = %task.id, pid, error = %e, "failed to signal hung worker wrapper");
    }
}

/// Steps 6-7: select dispatchable queued tasks up to the adaptive cap and
/// actually spawn each one, reusing the single-task dispatch pipeline.
async fn dispatch_ready(ctx: &Context, batch: Option<String>) -> anyhow::Result<u32> {
    let queued = match &batch {
        Some(b) => ctx
            .store
            .list_tasks_for_batch(&sv_core::batch::BatchId::from_string(b))?
            .into_iter()
            .filter(|t| t.status == TaskState::Queued)
            .collect(),
        None => ctx.store.list_tasks(Some(TaskState::Queued))?,
    };
    let all_tasks = ctx.store.list_tasks(None)?;
    let dispatchable: Vec<_> =
        queued.into_iter().filter(|t| is_dispatchable_by_subtask_ordering(t, &all_tasks)).collect();

    let running = ctx.store.list_tasks(Some(TaskState::Running))?.len() as u32;
    let cap = ctx.env.config.max_concurrency.saturating_sub(running) as usize;
    let candidates = select_candidates(&dispatchable, cap);

    let mut dispatched = 0;
    for task in candidates {
        match dispatch::run(ctx, task.id.as_str(), batch.clone()).await {
            Ok(()) => dispatched += 1,
            Err(e) => tracing::warn!(task = %task.id, error = %e, "pulse dispatch attempt failed"),
        }
    }
    Ok(dispatched)
}
