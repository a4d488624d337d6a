// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv cancel <id|batch>` — cancellation is idempotent (spec.md §5, §8):
//! cancelling an already-terminal task is a no-op, not an error. A task
//! with a live worker gets its wrapper signalled with `SIGTERM` so the
//! wrapper's own EXIT trap reaps the descendant process tree (spec.md §5
//! "Cancellation").

use crate::context::Context;
use crate::output::print_batch_action_results;
use nix::sys::signal::Signal;
use sv_core::batch::BatchId;
use sv_core::state::TaskState;
use sv_core::task::{Task, TaskId};

pub async fn run(ctx: &Context, id: &str) -> anyhow::Result<()> {
    if id.starts_with("bat-") {
        return cancel_batch(ctx, id).await;
    }
    let task = super::require_task(&ctx.store, id)?;
    if task.status == TaskState::Cancelled {
        println!("Task {} was already terminal", task.id);
        return Ok(());
    }
    signal_live_worker(&task);
    let task = ctx.store.transition(&TaskId::new(id), TaskState::Cancelled, "manual cancel", ctx.now_ms(), None)?;
    println!("Cancelled task {}", task.id);
    Ok(())
}

async fn cancel_batch(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let batch_id = BatchId::from_string(id);
    let tasks = ctx.store.list_tasks_for_batch(&batch_id)?;
    let mut actioned = Vec::new();
    let mut already_terminal = Vec::new();
    for task in tasks {
        if task.status == TaskState::Cancelled {
            already_terminal.push(task.id.to_string());
            continue;
        }
        signal_live_worker(&task);
        ctx.store.transition(&task.id, TaskState::Cancelled, "batch cancel", ctx.now_ms(), None)?;
        actioned.push(task.id.to_string());
    }
    print_batch_action_results(&actioned, "Cancelled", &already_terminal, &[]);
    Ok(())
}

/// Best-effort: a task with no `session_handle`, or whose wrapper has
/// already exited, has nothing to signal.
fn signal_live_worker(task: &Task) {
    let Some(handle) = &task.session_handle else { return };
    let Ok(pid) = handle.parse::<i32>() else { return };
    if let Err(e) = sv_adapters::process::signal_wrapper(pid, Signal::SIGTERM) {
        tracing::warn!(task = %task.id, pid, error = %e, "failed to signal worker wrapper on cancel");
    }
}
