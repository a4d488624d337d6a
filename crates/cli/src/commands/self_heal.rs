// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv self-heal <id>` — run the self-heal decision for one failed task and
//! apply it (spec.md §4.5). Operator-triggered equivalent of the step the
//! pulse loop runs automatically for every task that just finished
//! evaluating.

use crate::context::Context;
use crate::exit_error::ExitError;
use sv_core::outcome::OutcomeKind;
use sv_core::state::TaskState;
use sv_core::task::ModelTier;
use sv_engine::ai::{apply_advice, DeterministicAdvisor, HealAdvisor};
use sv_engine::self_heal::{self, build_diagnostic_description, diagnostic_task_id, SelfHealAction, SelfHealFacts};

pub async fn run(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let task = super::require_task(&ctx.store, id)?;
    if !matches!(task.status, TaskState::Failed | TaskState::Blocked) {
        return Err(ExitError::new(1, format!("{} is {}, not a failed/blocked task", task.id, task.status)).into());
    }

    let outcome = task
        .error_key
        .as_deref()
        .map(classify_error_key)
        .unwrap_or(OutcomeKind::CleanExitNoSignal);

    let existing_live_diagnostic = ctx.store.get_task(&diagnostic_task_id(&task.id))?.and_then(|d| {
        (!matches!(d.status, TaskState::Complete | TaskState::Deployed | TaskState::Verified | TaskState::Cancelled))
            .then_some(d.id)
    });

    let facts = SelfHealFacts {
        outcome,
        prompt_repeat_done: task.prompt_repeat_done,
        current_tier: task.requested_tier.unwrap_or(ModelTier::Sonnet),
        escalation_remaining: task.escalation_remaining(),
        retries_remaining: task.retries_remaining(),
        existing_live_diagnostic,
    };

    let tail = read_log_tail(&task.log_path);
    let advisor = DeterministicAdvisor;
    let advice = advisor.advise(&task, &facts, &tail).await;
    let action = if ctx.env.config.self_heal_ai { apply_advice(&facts, &advice) } else { self_heal::decide(&facts) };

    apply_action(ctx, &task, action, &tail).await
}

fn classify_error_key(key: &str) -> OutcomeKind {
    match sv_core::action::normalize_error_key(key) {
        "auth_error" => OutcomeKind::AuthError,
        "merge_conflict" => OutcomeKind::MergeConflict,
        "out_of_memory" => OutcomeKind::OutOfMemory,
        "quota_error" => OutcomeKind::QuotaError,
        "rate_limited" => OutcomeKind::RateLimited,
        "timeout" => OutcomeKind::Timeout,
        "worker_never_started" => OutcomeKind::WorkerNeverStarted,
        "worker_dispatch_error" => OutcomeKind::WorkerDispatchError,
        "trivial_output" => OutcomeKind::TrivialOutput,
        "work_in_progress" => OutcomeKind::WorkInProgress,
        "verify_incomplete" => OutcomeKind::VerifyIncomplete,
        "verify_not_started" => OutcomeKind::VerifyNotStarted,
        _ => OutcomeKind::CleanExitNoSignal,
    }
}

fn read_log_tail(log_path: &Option<std::path::PathBuf>) -> String {
    log_path.as_ref().and_then(|p| std::fs::read_to_string(p).ok()).unwrap_or_default()
}

async fn apply_action(
    ctx: &Context,
    task: &sv_core::task::Task,
    action: SelfHealAction,
    tail: &str,
) -> anyhow::Result<()> {
    let now_ms = ctx.now_ms();
    match action {
        SelfHealAction::PromptRepeat => {
            let mut updated = task.clone();
            updated.prompt_repeat_done = true;
            ctx.store.update_task(&updated)?;
            ctx.store.transition(&task.id, TaskState::Queued, "self-heal: prompt-repeat", now_ms, None)?;
            println!("{}: prompt-repeat queued", task.id);
        }
        SelfHealAction::Escalate(tier) => {
            let mut updated = task.clone();
            updated.requested_tier = Some(tier);
            updated.escalation_depth += 1;
            ctx.store.update_task(&updated)?;
            ctx.store.transition(&task.id, TaskState::Queued, &format!("self-heal: escalate to {tier}"), now_ms, None)?;
            println!("{}: escalated to {tier}", task.id);
        }
        SelfHealAction::RequeueUnchanged => {
            ctx.store.transition(&task.id, TaskState::Queued, "self-heal: infrastructure failure, requeue", now_ms, None)?;
            println!("{}: requeued unchanged (infrastructure failure)", task.id);
        }
        SelfHealAction::Diagnostic => {
            let diag = sv_core::task::Task {
                id: diagnostic_task_id(&task.id),
                repo: task.repo.clone(),
                description: build_diagnostic_description(task, tail),
                status: TaskState::Queued,
                requested_tier: None,
                resolved_model: None,
                retries: 0,
                max_retries: task.max_retries,
                escalation_depth: 0,
                max_escalation: task.max_escalation,
                session_handle: None,
                worktree_path: None,
                branch: None,
                log_path: None,
                pr_url: None,
                issue_url: None,
                diagnostic_of: Some(task.id.clone()),
                last_failure_at: None,
                consecutive_failure_count: 0,
                prompt_repeat_done: false,
                pre_dispatch_main_sha: None,
                created_at: now_ms,
                started_at: None,
                evaluating_started_at: None,
                completed_at: None,
                evaluation_duration_ms: None,
                batch_id: task.batch_id,
                tags: task.tags.clone(),
                blocked_by: Vec::new(),
                error_key: None,
            };
            ctx.store.insert_task(&diag)?;
            println!("{}: diagnostic subtask {} created", task.id, diag.id);
        }
        SelfHealAction::Stop => {
            let next = if task.status == TaskState::Blocked { TaskState::Blocked } else { TaskState::Failed };
            if task.status != next {
                ctx.store.transition(&task.id, next, "self-heal: exhausted, human intervention required", now_ms, None)?;
            }
            println!("{}: self-heal exhausted, needs human intervention", task.id);
        }
    }
    Ok(())
}
