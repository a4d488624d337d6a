// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv transition <id> <state> [--error R]` — a bare, ungated state-table
//! transition for operator use (spec.md §6). No guards beyond the
//! transition table itself are bypassed: `complete -> deployed` still
//! requires a merged PR, enforced by [`sv_storage::Store::transition`].

use crate::context::Context;
use crate::exit_error::ExitError;
use sv_adapters::forge::ForgeCli;
use std::str::FromStr;
use sv_core::state::TaskState;
use sv_core::task::{is_real_pr_url, TaskId};

pub async fn run(ctx: &Context, id: &str, state: &str, error: Option<String>) -> anyhow::Result<()> {
    let to = TaskState::from_str(state).map_err(|e| ExitError::new(1, e))?;
    let reason = error.unwrap_or_else(|| format!("manual transition to {to}"));

    let upstream_pr_merged = if to == TaskState::Deployed {
        let task = super::require_task(&ctx.store, id)?;
        Some(if task.pr_url.as_deref().is_some_and(is_real_pr_url) {
            let pr_url = task.pr_url.as_deref().expect("checked above");
            ctx.forge.pr_state(&task.repo, pr_url).await.known().is_some_and(|s| s.merged)
        } else {
            false
        })
    } else {
        None
    };

    let task = ctx.store.transition(&TaskId::new(id), to, &reason, ctx.now_ms(), upstream_pr_merged)?;
    println!("{} -> {}", task.id, task.status);
    Ok(())
}
