// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv worker-status <id>` — sentinel summary for a task's current or most
//! recent worker log (spec.md §6 "Worker lifecycle").

use crate::context::Context;
use crate::exit_error::ExitError;
use sv_engine::evaluator::parse_log;

pub fn run(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let task = super::require_task(&ctx.store, id)?;
    let Some(log_path) = &task.log_path else {
        println!("{}: no worker has been dispatched yet", task.id);
        return Ok(());
    };
    let raw = std::fs::read_to_string(log_path)
        .map_err(|e| ExitError::new(1, format!("reading {}: {e}", log_path.display())))?;
    let sentinels = parse_log(&raw);

    let elapsed_ms = std::fs::metadata(log_path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|m| m.elapsed().ok())
        .map(|d| d.as_millis() as i64);
    let hung_timeout_ms = (ctx.env.config.heartbeat_interval.as_millis() as i64) * 3;
    let alive = elapsed_ms.is_some_and(|ms| ms < hung_timeout_ms);

    println!("{}: {}", task.id, task.status);
    println!("  wrapper_started: {}", sentinels.wrapper_started);
    println!("  worker_started: {}", sentinels.worker_started);
    println!("  full_loop_complete: {}", sentinels.full_loop_complete);
    println!("  exit_code: {:?}", sentinels.exit_code);
    println!("  pr_url: {:?}", sentinels.pr_url);
    println!("  log size: {} bytes", sentinels.size_bytes);
    println!("  likely alive: {alive}");
    Ok(())
}
