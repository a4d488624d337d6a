// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv status [task|batch|global]` (spec.md §6 CLI surface).

use crate::context::Context;
use crate::output::{format_or_json, format_time_ago, OutputFormat};
use serde::Serialize;
use std::collections::BTreeMap;
use sv_core::batch::BatchId;
use sv_core::state::TaskState;

#[derive(Serialize)]
struct TaskStatus {
    id: String,
    repo: String,
    status: String,
    retries: u32,
    max_retries: u32,
    escalation_depth: u32,
    pr_url: Option<String>,
    last_failure_at: Option<i64>,
}

#[derive(Serialize)]
struct BatchStatus {
    id: String,
    name: String,
    by_state: BTreeMap<String, u32>,
    total: u32,
}

#[derive(Serialize)]
struct GlobalStatus {
    by_state: BTreeMap<String, u32>,
    total: u32,
}

pub fn run(ctx: &Context, target: Option<String>, format: OutputFormat) -> anyhow::Result<()> {
    match target {
        None => global_status(ctx, format),
        Some(id) if id.starts_with("bat-") => batch_status(ctx, &id, format),
        Some(id) => task_status(ctx, &id, format),
    }
}

fn task_status(ctx: &Context, id: &str, format: OutputFormat) -> anyhow::Result<()> {
    let task = super::require_task(&ctx.store, id)?;
    let now_ms = ctx.now_ms();
    let data = TaskStatus {
        id: task.id.to_string(),
        repo: task.repo.display().to_string(),
        status: task.status.to_string(),
        retries: task.retries,
        max_retries: task.max_retries,
        escalation_depth: task.escalation_depth,
        pr_url: task.pr_url.clone(),
        last_failure_at: task.last_failure_at,
    };
    format_or_json(format, &data, || {
        println!("{}  {}  {}", data.id, data.status, data.repo);
        println!("  retries: {}/{}  escalation: {}", data.retries, data.max_retries, data.escalation_depth);
        if let Some(pr) = &data.pr_url {
            println!("  pr: {pr}");
        }
        if let Some(at) = data.last_failure_at {
            println!("  last failure: {} ago", format_time_ago(at, now_ms));
        }
    })
}

fn batch_status(ctx: &Context, id: &str, format: OutputFormat) -> anyhow::Result<()> {
    let batch_id = BatchId::from_string(id.to_string());
    let batch = ctx.store.require_batch(&batch_id)?;
    let tasks = ctx.store.list_tasks_for_batch(&batch_id)?;
    let by_state = tally(tasks.iter().map(|t| t.status));
    let data = BatchStatus {
        id: batch.id.to_string(),
        name: batch.name.clone(),
        total: tasks.len() as u32,
        by_state,
    };
    format_or_json(format, &data, || {
        println!("{}  {}  ({} tasks)", data.id, data.name, data.total);
        for (state, count) in &data.by_state {
            println!("  {state}: {count}");
        }
    })
}

fn global_status(ctx: &Context, format: OutputFormat) -> anyhow::Result<()> {
    let tasks = ctx.store.list_tasks(None)?;
    let data = GlobalStatus { total: tasks.len() as u32, by_state: tally(tasks.iter().map(|t| t.status)) };
    format_or_json(format, &data, || {
        println!("{} tasks total", data.total);
        for (state, count) in &data.by_state {
            println!("  {state}: {count}");
        }
    })
}

fn tally(states: impl Iterator<Item = TaskState>) -> BTreeMap<String, u32> {
    let mut by_state = BTreeMap::new();
    for state in states {
        *by_state.entry(state.to_string()).or_insert(0) += 1;
    }
    by_state
}
