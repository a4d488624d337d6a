// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod backup;
pub mod cancel;
pub mod circuit_breaker;
pub mod cron;
pub mod dispatch;
pub mod init;
pub mod list;
pub mod next;
pub mod pulse;
pub mod reprompt;
pub mod reset;
pub mod self_heal;
pub mod status;
pub mod transition;
pub mod worker_status;

use sv_core::task::{Task, TaskId};
use sv_storage::Store;

/// Resolve a task ID string, erroring with the conventional "not found"
/// message every command should give for a bad ID (spec.md §7 "missing
/// task row").
pub fn require_task(store: &Store, id: &str) -> anyhow::Result<Task> {
    Ok(store.require_task(&TaskId::new(id))?)
}
