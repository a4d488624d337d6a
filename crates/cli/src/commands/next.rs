// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv next [batch] [limit]` — emits dispatchable rows, tab-separated
//! (spec.md §6), honoring subtask ordering (spec.md §3 invariant (e)).

use crate::context::Context;
use sv_core::batch::BatchId;
use sv_core::state::TaskState;
use sv_engine::dispatch::{is_dispatchable_by_subtask_ordering, select_candidates};

pub fn run(ctx: &Context, batch: Option<String>, limit: Option<usize>) -> anyhow::Result<()> {
    let queued = match &batch {
        Some(b) => ctx
            .store
            .list_tasks_for_batch(&BatchId::from_string(b))?
            .into_iter()
            .filter(|t| t.status == TaskState::Queued)
            .collect(),
        None => ctx.store.list_tasks(Some(TaskState::Queued))?,
    };

    let all_tasks = ctx.store.list_tasks(None)?;
    let dispatchable: Vec<_> =
        queued.iter().filter(|t| is_dispatchable_by_subtask_ordering(t, &all_tasks)).collect();

    let n = limit.unwrap_or(dispatchable.len());
    let owned: Vec<_> = dispatchable.into_iter().cloned().collect();
    for task in select_candidates(&owned, n) {
        println!("{}\t{}\t{}\t{}", task.id, task.repo.display(), task.retries, task.status);
    }
    Ok(())
}
