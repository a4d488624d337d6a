// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv reset <id>` — administrative reset of a terminal task back to
//! `queued` (spec.md §4.2 "Guard: reset"): refused if upstream history
//! shows the task already delivered via a merged PR.

use crate::context::Context;
use crate::exit_error::ExitError;
use sv_adapters::forge::ForgeCli;
use sv_core::state::{check_reset_guard, TaskState};
use sv_core::task::{is_real_pr_url, TaskId};

pub async fn run(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let task = super::require_task(&ctx.store, id)?;
    if !TaskState::RESETTABLE.contains(&task.status) {
        return Err(ExitError::new(
            1,
            format!("task {} is in {} which is not reset-eligible", task.id, task.status),
        )
        .into());
    }

    let already_delivered = if task.pr_url.as_deref().is_some_and(is_real_pr_url) {
        let pr_url = task.pr_url.as_deref().expect("checked above");
        ctx.forge.pr_state(&task.repo, pr_url).await.known().is_some_and(|s| s.merged)
    } else {
        false
    };
    check_reset_guard(already_delivered)?;

    let task = ctx.store.transition(&TaskId::new(id), TaskState::Queued, "administrative reset", ctx.now_ms(), None)?;
    println!("{} -> {}", task.id, task.status);
    Ok(())
}
