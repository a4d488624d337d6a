// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv list [--state S] [--batch B] [--format json]` (spec.md §6).

use crate::context::Context;
use crate::output::{apply_limit, handle_list_with_limit, OutputFormat};
use serde::Serialize;
use std::io::Write as _;
use std::str::FromStr;
use sv_core::batch::BatchId;
use sv_core::state::TaskState;

#[derive(Serialize)]
struct TaskRow {
    id: String,
    repo: String,
    status: String,
    retries: u32,
    pr_url: Option<String>,
}

pub fn run(
    ctx: &Context,
    state: Option<String>,
    batch: Option<String>,
    format: OutputFormat,
    limit: usize,
    no_limit: bool,
) -> anyhow::Result<()> {
    let filter_state = state.as_deref().map(TaskState::from_str).transpose().map_err(anyhow::Error::msg)?;

    let mut tasks = match &batch {
        Some(b) => ctx.store.list_tasks_for_batch(&BatchId::from_string(b))?,
        None => ctx.store.list_tasks(filter_state)?,
    };
    if batch.is_some() {
        if let Some(s) = filter_state {
            tasks.retain(|t| t.status == s);
        }
    }
    tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let mut rows: Vec<TaskRow> = tasks
        .iter()
        .map(|t| TaskRow {
            id: t.id.to_string(),
            repo: t.repo.display().to_string(),
            status: t.status.to_string(),
            retries: t.retries,
            pr_url: t.pr_url.clone(),
        })
        .collect();

    let truncation = apply_limit(&mut rows, limit, no_limit);

    handle_list_with_limit(format, &rows, "no tasks found", truncation, |rows, w| {
        for row in rows {
            let _ = writeln!(w, "{}\t{}\t{}\t{}", row.id, row.status, row.retries, row.repo);
        }
    })
}
