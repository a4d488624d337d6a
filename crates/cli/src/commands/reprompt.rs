// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv reprompt <id> [--prompt "..."]` — re-dispatch a failed task with an
//! optional replacement prompt (spec.md §4.5.1 prompt-repeat strategy,
//! exposed here for operator-initiated retries outside the self-heal loop).

use crate::context::Context;
use sv_core::outcome::OutcomeKind;
use sv_core::state::TaskState;
use sv_engine::self_heal::build_prompt_repeat;

pub async fn run(ctx: &Context, id: &str, prompt: Option<String>) -> anyhow::Result<()> {
    let mut task = super::require_task(&ctx.store, id)?;
    // The task's normalized error_key doesn't round-trip to an OutcomeKind;
    // an operator-initiated reprompt has no live evaluation to classify, so
    // the prompt-repeat template just names the failure generically.
    let previous_outcome = OutcomeKind::WorkInProgress;

    task.description = prompt.unwrap_or_else(|| build_prompt_repeat(&task, previous_outcome, task.retries + 1));
    ctx.store.update_task(&task)?;
    let task = ctx.store.transition(&task.id, TaskState::Queued, "operator reprompt", ctx.now_ms(), None)?;
    println!("{} -> {} (will re-dispatch with the updated prompt)", task.id, task.status);
    Ok(())
}
