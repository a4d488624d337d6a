// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree acquisition (spec.md §4.3 step 7, §5 "Worktrees are
//! exclusive per task"): one isolated working directory per task, reused
//! across retries of the same branch rather than recreated.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("git worktree add for branch {branch} timed out")]
    Timeout { branch: String },
    #[error("failed to spawn git: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("git worktree add for branch {branch} failed: {stderr}")]
    GitFailed { branch: String, stderr: String },
}

/// Acquire the worktree for `branch` at `path`, checked out from `repo`.
/// If `path` already exists (a prior dispatch or retry already created it),
/// this is a no-op — the task reuses its existing worktree rather than
/// colliding with the still-checked-out branch.
pub async fn acquire(repo: &Path, path: &Path, branch: &str) -> Result<(), WorktreeError> {
    if path.exists() {
        return Ok(());
    }

    let call = Command::new("git")
        .args(["worktree", "add", "-B", branch, &path.display().to_string()])
        .current_dir(repo)
        .output();

    match timeout(DEFAULT_TIMEOUT, call).await {
        Ok(Ok(output)) if output.status.success() => Ok(()),
        Ok(Ok(output)) => Err(WorktreeError::GitFailed {
            branch: branch.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
        Ok(Err(source)) => Err(WorktreeError::Spawn(source)),
        Err(_) => Err(WorktreeError::Timeout { branch: branch.to_string() }),
    }
}

/// The branch name a fresh dispatch of `task_id` claims (spec.md §4.3 step
/// 7: "If the branch already exists with an open PR, reuse"). Callers
/// check the task's stored `branch` field first and only fall back to this
/// for a task's first dispatch.
pub fn default_branch_name(task_id: &str) -> String {
    format!("sv/{task_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_branch_name_is_namespaced_by_task_id() {
        assert_eq!(default_branch_name("t1"), "sv/t1");
    }
}
